pub mod builder;
mod config;
pub mod manual;
pub mod quick_start;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

/// How the song labels found in the ballots line up with the submissions.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnReport {
    /// Ballot labels that do not correspond to any submission. They are ignored when scoring.
    pub unmatched_labels: Vec<String>,
    /// Ballot labels of the submissions that no ballot column refers to.
    pub missing_submissions: Vec<String>,
}

impl ColumnReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched_labels.is_empty() && self.missing_submissions.is_empty()
    }
}

/// Puts a song label in a form that survives copy-pasting between a playlist and a form:
/// typographic quotes become straight quotes and whitespace is collapsed.
pub fn normalize_label(label: &str) -> String {
    let straight = label
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    straight.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Checks that every submitter and every song appears only once.
pub fn validate_submissions(submissions: &[Submission]) -> Result<(), ScoringErrors> {
    if submissions.is_empty() {
        return Err(ScoringErrors::EmptyRound);
    }
    let mut submitters: HashSet<&str> = HashSet::new();
    let mut labels: HashSet<String> = HashSet::new();
    for s in submissions.iter() {
        if !submitters.insert(s.submitter.as_str()) {
            return Err(ScoringErrors::DuplicateSubmitter(s.submitter.clone()));
        }
        if !labels.insert(normalize_label(&s.ballot_label())) {
            return Err(ScoringErrors::DuplicateSong(s.ballot_label()));
        }
    }
    Ok(())
}

/// Compares the song labels of the ballot table with the submissions of the round.
pub fn check_ballot_columns(submissions: &[Submission], labels: &[String]) -> ColumnReport {
    let expected: HashSet<String> = submissions
        .iter()
        .map(|s| normalize_label(&s.ballot_label()))
        .collect();
    let found: HashSet<String> = labels.iter().map(|l| normalize_label(l)).collect();

    let unmatched_labels: Vec<String> = labels
        .iter()
        .filter(|l| !expected.contains(&normalize_label(l)))
        .cloned()
        .collect();
    let missing_submissions: Vec<String> = submissions
        .iter()
        .map(|s| s.ballot_label())
        .filter(|l| !found.contains(&normalize_label(l)))
        .collect();
    debug!(
        "check_ballot_columns: unmatched: {:?} missing: {:?}",
        unmatched_labels, missing_submissions
    );
    ColumnReport {
        unmatched_labels,
        missing_submissions,
    }
}

/// Converts the ballots into one score row per submission.
///
/// The rows are sorted by decreasing points. The sort is stable: rows with the same
/// number of points keep the order of the submissions.
pub fn score_round(
    submissions: &[Submission],
    ballots: &[Ballot],
) -> Result<Vec<ScoreRow>, ScoringErrors> {
    validate_submissions(submissions)?;
    info!(
        "score_round: scoring {:?} submissions with {:?} ballots",
        submissions.len(),
        ballots.len()
    );

    let label_index: HashMap<String, usize> = submissions
        .iter()
        .enumerate()
        .map(|(idx, s)| (normalize_label(&s.ballot_label()), idx))
        .collect();

    // first, second, third
    let mut counts: Vec<[u32; 3]> = vec![[0; 3]; submissions.len()];
    let mut voters: HashSet<&str> = HashSet::new();
    for ballot in ballots.iter() {
        if !voters.insert(ballot.voter.as_str()) {
            return Err(ScoringErrors::DuplicateVoter(ballot.voter.clone()));
        }
        for (label, rank) in ballot.ranks.iter() {
            match label_index.get(&normalize_label(label)) {
                Some(idx) => {
                    let slot = match rank {
                        Rank::First => 0,
                        Rank::Second => 1,
                        Rank::Third => 2,
                    };
                    counts[*idx][slot] += 1;
                }
                None => {
                    debug!(
                        "score_round: voter {}: skipping choice for unknown song {:?}",
                        ballot.voter, label
                    );
                }
            }
        }
    }

    let mut rows: Vec<ScoreRow> = submissions
        .iter()
        .zip(counts.iter())
        .map(|(s, c)| ScoreRow::new(&s.submitter, c[0], c[1], c[2]))
        .collect();
    rows.sort_by(|a, b| b.points.cmp(&a.points));
    for r in rows.iter() {
        debug!("score_round: {:?}", r);
    }
    Ok(rows)
}

/// Running sums of the weights.
pub fn cumulative_weights(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .scan(0.0, |acc, w| {
            *acc += w;
            Some(*acc)
        })
        .collect()
}

/// Finds the entry of the cumulative distribution that contains `x`.
///
/// This is a binary search returning the first index whose running sum is strictly
/// greater than `x`. A value at or past the end selects the last entry.
pub fn locate_in_cumulative(cumdist: &[f64], x: f64) -> usize {
    let idx = cumdist.partition_point(|c| *c <= x);
    idx.min(cumdist.len().saturating_sub(1))
}

/// Turns a text into a seed. Integers are used as is, any other text is hashed.
pub fn seed_from_text(text: &str) -> u64 {
    if let Ok(x) = text.trim().parse::<u64>() {
        return x;
    }
    let hex = sha256::digest(text.to_string());
    u64::from_str_radix(&hex[..16], 16).unwrap_or_default()
}

/// The seed used when none is configured: rerunning the same round gives the same draw.
pub fn default_seed(date: NaiveDate) -> u64 {
    seed_from_text(&date.format("%Y.%m.%d").to_string())
}

/// Runs the weighted random draw between the tied submitters.
///
/// The tied submitters share `pool_weight` equally. The house candidate, when present
/// with a positive weight, is added as the last entry of the draw.
pub fn draw_tiebreak(
    tied: &[String],
    pool_weight: f64,
    house: Option<&HouseCandidate>,
    seed: u64,
) -> Result<TiebreakDraw, ScoringErrors> {
    if tied.is_empty() {
        return Err(ScoringErrors::EmptyRound);
    }
    let odds = pool_weight / tied.len() as f64;
    if !odds.is_finite() || odds <= 0.0 {
        return Err(ScoringErrors::InvalidWeights);
    }

    let mut weighted_choices: Vec<(String, f64)> =
        tied.iter().map(|name| (name.clone(), odds)).collect();
    if let Some(h) = house {
        if !h.weight.is_finite() || h.weight < 0.0 {
            return Err(ScoringErrors::InvalidWeights);
        }
        if h.weight > 0.0 {
            weighted_choices.push((h.name.clone(), h.weight));
        }
    }

    let weights: Vec<f64> = weighted_choices.iter().map(|p| p.1).collect();
    let cumdist = cumulative_weights(&weights);
    let total = cumdist.last().cloned().unwrap_or(0.0);

    let mut rng = StdRng::seed_from_u64(seed);
    let u: f64 = rng.gen();
    let value = u * total;
    let selected = locate_in_cumulative(&cumdist, value);

    let entries: Vec<DrawEntry> = weighted_choices
        .into_iter()
        .zip(cumdist)
        .map(|((name, weight), cumulative)| DrawEntry {
            name,
            weight,
            cumulative,
        })
        .collect();
    debug!(
        "draw_tiebreak: seed {} value {} entries {:?} -> {}",
        seed, value, entries, selected
    );
    Ok(TiebreakDraw {
        seed,
        value,
        entries,
        selected,
    })
}

fn winning_song(submissions: &[Submission], submitter: &str) -> Result<String, ScoringErrors> {
    submissions
        .iter()
        .find(|s| s.submitter == submitter)
        .map(|s| s.display_name())
        .ok_or_else(|| ScoringErrors::UnknownWinner(submitter.to_string()))
}

/// Picks the winner of the round from the sorted score rows.
pub fn resolve_round(
    scores: &[ScoreRow],
    submissions: &[Submission],
    rules: &ScoringRules,
    date: NaiveDate,
) -> Result<RoundResult, ScoringErrors> {
    let max_points = scores
        .iter()
        .map(|r| r.points)
        .max()
        .ok_or(ScoringErrors::EmptyRound)?;
    let tied: Vec<String> = scores
        .iter()
        .filter(|r| r.points == max_points)
        .map(|r| r.submitter.clone())
        .collect();
    let winner_count = tied.len();
    info!(
        "resolve_round: max points: {} winner count: {}",
        max_points, winner_count
    );

    let outcome = if winner_count == 1 {
        let submitter = tied[0].clone();
        let song = winning_song(submissions, &submitter)?;
        info!("resolve_round: winner: {} song: {}", submitter, song);
        Outcome::Winner { submitter, song }
    } else {
        info!("resolve_round: tied: {}", tied.join(", "));
        match &rules.tiebreak_mode {
            TieBreakMode::UseSubmissionOrder => {
                let submitter = tied[0].clone();
                let song = winning_song(submissions, &submitter)?;
                info!(
                    "resolve_round: tiebreak by submission order: {} song: {}",
                    submitter, song
                );
                Outcome::TiebreakWinner {
                    submitter,
                    song,
                    draw: None,
                }
            }
            TieBreakMode::WeightedRandom { pool_weight, house } => {
                let seed = rules.random_seed.unwrap_or_else(|| default_seed(date));
                let draw = draw_tiebreak(&tied, *pool_weight, house.as_ref(), seed)?;
                let selected = draw.entries[draw.selected].name.clone();
                // The house candidate is always last in the draw.
                let is_house = house.is_some() && draw.selected >= tied.len();
                if is_house {
                    warn!(
                        "resolve_round: the house candidate {} was drawn (value {} of {})",
                        selected,
                        draw.value,
                        draw.entries.last().map(|e| e.cumulative).unwrap_or(0.0)
                    );
                    Outcome::HouseDrawn {
                        name: selected,
                        draw,
                    }
                } else {
                    let song = winning_song(submissions, &selected)?;
                    info!(
                        "resolve_round: tiebreak winner: {} song: {}",
                        selected, song
                    );
                    Outcome::TiebreakWinner {
                        submitter: selected,
                        song,
                        draw: Some(draw),
                    }
                }
            }
        }
    };

    Ok(RoundResult {
        date,
        scores: scores.to_vec(),
        max_points,
        winner_count,
        tied,
        outcome,
    })
}

/// Scores the ballots and resolves the winner.
pub fn run_round(
    submissions: &[Submission],
    ballots: &[Ballot],
    rules: &ScoringRules,
    date: NaiveDate,
) -> Result<RoundResult, ScoringErrors> {
    let scores = score_round(submissions, ballots)?;
    let result = resolve_round(&scores, submissions, rules, date)?;
    info!(
        "run_round: {} points were given this round",
        result.total_points()
    );
    Ok(result)
}

/// Shapes the result of a round into a ledger row.
///
/// The points are listed in alphabetical order of the submitters.
pub fn ledger_entry(result: &RoundResult) -> Result<LedgerEntry, ScoringErrors> {
    let (winner, song) = result.outcome.winner().ok_or(ScoringErrors::NoWinner)?;
    let mut points: Vec<(String, u32)> = result
        .scores
        .iter()
        .map(|r| (r.submitter.clone(), r.points))
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(LedgerEntry {
        date: result.date,
        winner: winner.to_string(),
        winning_song: song.to_string(),
        points,
        total_points: result.total_points(),
        scores: result.scores.clone(),
    })
}
