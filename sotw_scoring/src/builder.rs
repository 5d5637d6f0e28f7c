pub use crate::config::*;

use chrono::NaiveDate;
use log::warn;
use std::collections::HashSet;

/// A builder for collecting the ballots of a round.
///
/// ```
/// use chrono::NaiveDate;
/// use sotw_scoring::builder::Builder;
/// use sotw_scoring::{ScoringErrors, ScoringRules, Submission};
///
/// let mut builder = Builder::new(&ScoringRules::default())?.submissions(&[
///     Submission::new("Alpha", "Band A", "Ann"),
///     Submission::new("Bravo", "Band B", "Ben"),
/// ])?;
///
/// builder.add_ballot_simple(
///     "voter 1",
///     &[
///         ("\"Alpha\" - Band A".to_string(), "First Place".to_string()),
///         ("\"Bravo\" - Band B".to_string(), "Second Place".to_string()),
///     ],
/// )?;
///
/// let date = NaiveDate::from_ymd_opt(2022, 8, 12).unwrap();
/// let result = builder.run(date)?;
/// assert_eq!(result.outcome.winner(), Some(("Ann", "Alpha - Band A")));
/// # Ok::<(), ScoringErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ScoringRules,
    pub(crate) _submissions: Vec<Submission>,
    pub(crate) _ballots: Vec<Ballot>,
    pub(crate) _voters: HashSet<String>,
}

impl Builder {
    pub fn new(rules: &ScoringRules) -> Result<Builder, ScoringErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _submissions: Vec::new(),
            _ballots: Vec::new(),
            _voters: HashSet::new(),
        })
    }

    /// Sets the songs of the round. Previously added ballots are dropped.
    pub fn submissions(self, submissions: &[Submission]) -> Result<Builder, ScoringErrors> {
        crate::validate_submissions(submissions)?;
        Ok(Builder {
            _rules: self._rules,
            _submissions: submissions.to_vec(),
            _ballots: Vec::new(),
            _voters: HashSet::new(),
        })
    }

    /// Adds a ballot given as the raw text of the cells.
    ///
    /// choices: pairs of (song label, cell content). Blank cells are skipped, cells that
    /// are not a rank label are skipped with a warning.
    pub fn add_ballot_simple(
        &mut self,
        voter: &str,
        choices: &[(String, String)],
    ) -> Result<(), ScoringErrors> {
        let mut ranks: Vec<(String, Rank)> = Vec::new();
        for (label, cell) in choices.iter() {
            match self._rules.rank_labels.parse(cell) {
                Some(rank) => ranks.push((label.clone(), rank)),
                None if cell.trim().is_empty() => {}
                None => {
                    warn!(
                        "add_ballot_simple: voter {}: skipping unknown rank {:?} for {:?}",
                        voter, cell, label
                    );
                }
            }
        }
        self.add_ballot(&Ballot {
            voter: voter.to_string(),
            ranks,
        })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), ScoringErrors> {
        if !self._voters.insert(ballot.voter.clone()) {
            return Err(ScoringErrors::DuplicateVoter(ballot.voter.clone()));
        }
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots
    }

    pub fn run(&self, date: NaiveDate) -> Result<RoundResult, ScoringErrors> {
        crate::run_round(&self._submissions, &self._ballots, &self._rules, date)
    }
}
