// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// A song entered in the round by one participant.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Submission {
    pub title: String,
    /// All the artists of the track, joined with `", "`.
    pub artists: String,
    pub submitter: String,
}

impl Submission {
    pub fn new(title: &str, artists: &str, submitter: &str) -> Submission {
        Submission {
            title: title.to_string(),
            artists: artists.to_string(),
            submitter: submitter.to_string(),
        }
    }

    /// The label under which this song appears on the ballots.
    pub fn ballot_label(&self) -> String {
        format!("\"{}\" - {}", self.title, self.artists)
    }

    /// The song as written in the ledger: `Title - Artists`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.title, self.artists)
    }
}

/// A place given by a voter to a song.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    pub const ALL: [Rank; 3] = [Rank::First, Rank::Second, Rank::Third];

    pub fn points(&self) -> u32 {
        match self {
            Rank::First => 3,
            Rank::Second => 2,
            Rank::Third => 1,
        }
    }
}

/// The text used on the ballots for each rank.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankLabels {
    pub first: String,
    pub second: String,
    pub third: String,
}

impl Default for RankLabels {
    fn default() -> Self {
        RankLabels {
            first: "First Place".to_string(),
            second: "Second Place".to_string(),
            third: "Third Place".to_string(),
        }
    }
}

impl RankLabels {
    /// Parses the content of a ballot cell.
    ///
    /// Blank cells are not a choice. Any other unknown text is not a choice either,
    /// the caller decides whether to complain about it.
    pub fn parse(&self, cell: &str) -> Option<Rank> {
        match cell.trim() {
            s if s == self.first => Some(Rank::First),
            s if s == self.second => Some(Rank::Second),
            s if s == self.third => Some(Rank::Third),
            _ => None,
        }
    }
}

/// All the choices made by one voter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    /// (song label, rank)
    pub ranks: Vec<(String, Rank)>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoreRow {
    pub submitter: String,
    pub first_count: u32,
    pub second_count: u32,
    pub third_count: u32,
    pub points: u32,
}

impl ScoreRow {
    pub fn new(submitter: &str, first_count: u32, second_count: u32, third_count: u32) -> ScoreRow {
        ScoreRow {
            submitter: submitter.to_string(),
            first_count,
            second_count,
            third_count,
            points: Rank::First.points() * first_count
                + Rank::Second.points() * second_count
                + Rank::Third.points() * third_count,
        }
    }
}

/// One entry in the weighted draw.
#[derive(PartialEq, Debug, Clone)]
pub struct DrawEntry {
    pub name: String,
    pub weight: f64,
    /// Running sum of the weights up to and including this entry.
    pub cumulative: f64,
}

/// The record of a weighted random tiebreak.
#[derive(PartialEq, Debug, Clone)]
pub struct TiebreakDraw {
    pub seed: u64,
    /// The uniform value, already scaled by the total weight.
    pub value: f64,
    pub entries: Vec<DrawEntry>,
    pub selected: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Outcome {
    /// A single submitter has the most points.
    Winner { submitter: String, song: String },
    /// Several submitters tied, one of them was selected.
    TiebreakWinner {
        submitter: String,
        song: String,
        draw: Option<TiebreakDraw>,
    },
    /// The house candidate was selected by the tiebreak. It does not correspond
    /// to any of the tied submissions, so there is no winner to record.
    HouseDrawn { name: String, draw: TiebreakDraw },
}

impl Outcome {
    /// The winning (submitter, song), if the outcome has one.
    pub fn winner(&self) -> Option<(&str, &str)> {
        match self {
            Outcome::Winner { submitter, song } => Some((submitter, song)),
            Outcome::TiebreakWinner {
                submitter, song, ..
            } => Some((submitter, song)),
            Outcome::HouseDrawn { .. } => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RoundResult {
    pub date: NaiveDate,
    /// Sorted by decreasing points.
    pub scores: Vec<ScoreRow>,
    pub max_points: u32,
    pub winner_count: usize,
    /// The submitters sharing the max points, in score order.
    pub tied: Vec<String>,
    pub outcome: Outcome,
}

impl RoundResult {
    pub fn total_points(&self) -> u32 {
        self.scores.iter().map(|r| r.points).sum()
    }
}

/// A row of the results ledger, ready to be written.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub winner: String,
    pub winning_song: String,
    /// Points of every submitter, in alphabetical order of the submitters.
    pub points: Vec<(String, u32)>,
    pub total_points: u32,
    /// The full scoring table, sorted by decreasing points.
    pub scores: Vec<ScoreRow>,
}

/// The persistent storage of the results.
pub trait LedgerWriter {
    type Error;

    fn append(&mut self, entry: &LedgerEntry) -> Result<(), Self::Error>;
}

/// Errors that prevent a round from being scored or resolved.
#[derive(PartialEq, Debug, Clone)]
pub enum ScoringErrors {
    EmptyRound,
    DuplicateSubmitter(String),
    DuplicateSong(String),
    DuplicateVoter(String),
    InvalidWeights,
    /// The winner has no submission this round.
    UnknownWinner(String),
    /// The round has no winner to put in the ledger.
    NoWinner,
}

impl Error for ScoringErrors {}

impl Display for ScoringErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringErrors::EmptyRound => write!(f, "no submission in this round"),
            ScoringErrors::DuplicateSubmitter(s) => {
                write!(f, "submitter {:?} has more than one submission", s)
            }
            ScoringErrors::DuplicateSong(s) => write!(f, "song {:?} is submitted twice", s),
            ScoringErrors::DuplicateVoter(s) => {
                write!(f, "voter {:?} has more than one ballot", s)
            }
            ScoringErrors::InvalidWeights => write!(f, "tiebreak weights must be positive"),
            ScoringErrors::UnknownWinner(s) => {
                write!(f, "winner {:?} has no submission this round", s)
            }
            ScoringErrors::NoWinner => write!(f, "the round has no winner"),
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone)]
pub struct HouseCandidate {
    pub name: String,
    pub weight: f64,
}

impl Default for HouseCandidate {
    fn default() -> Self {
        HouseCandidate {
            name: "House".to_string(),
            weight: ScoringRules::DEFAULT_HOUSE_WEIGHT,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TieBreakMode {
    /// The first tied row in score order wins.
    UseSubmissionOrder,
    /// The tied submitters share `pool_weight` equally. The house candidate, if any,
    /// enters the draw with its own weight.
    WeightedRandom {
        pool_weight: f64,
        house: Option<HouseCandidate>,
    },
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScoringRules {
    pub tiebreak_mode: TieBreakMode,
    /// If not provided, the seed is derived from the date of the round.
    pub random_seed: Option<u64>,
    pub rank_labels: RankLabels,
}

impl ScoringRules {
    pub const DEFAULT_POOL_WEIGHT: f64 = 999.0;
    pub const DEFAULT_HOUSE_WEIGHT: f64 = 1.0;

    pub fn weighted(house: Option<HouseCandidate>) -> ScoringRules {
        ScoringRules {
            tiebreak_mode: TieBreakMode::WeightedRandom {
                pool_weight: ScoringRules::DEFAULT_POOL_WEIGHT,
                house,
            },
            random_seed: None,
            rank_labels: RankLabels::default(),
        }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules::weighted(Some(HouseCandidate::default()))
    }
}
