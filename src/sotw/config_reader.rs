use crate::sotw::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RoundSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    /// YYYY-MM-DD
    #[serde(rename = "roundDate")]
    pub round_date: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedSong {
    pub title: String,
    pub artists: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub offset: Option<usize>,
    #[serde(rename = "songCount")]
    pub song_count: Option<usize>,
    pub excluded: Option<Vec<ExcludedSong>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "voterColumn")]
    pub voter_column: Option<String>,
    #[serde(rename = "rankLabels")]
    pub rank_labels: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// The ids under which this participant adds songs to the playlist.
    pub usernames: Option<Vec<String>>,
    /// Replaces the title of the song of this participant for this round.
    #[serde(rename = "songTitle")]
    pub song_title: Option<String>,
    #[serde(rename = "ledgerColumn")]
    pub ledger_column: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "poolWeight")]
    pub pool_weight: Option<f64>,
    #[serde(rename = "houseCandidate")]
    pub house_candidate: Option<String>,
    #[serde(rename = "houseWeight")]
    pub house_weight: Option<f64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub directory: String,
    /// The last row written in the append-only tables. Incremented by hand after each round.
    #[serde(rename = "lastRow")]
    pub last_row: usize,
    #[serde(rename = "pointsTableRows")]
    pub points_table_rows: Option<usize>,
    /// Date, winner, winning song, date.
    #[serde(rename = "resultColumns")]
    pub result_columns: Option<Vec<String>>,
    #[serde(rename = "availablePointsColumns")]
    pub available_points_columns: Option<Vec<String>>,
}

impl LedgerConfig {
    pub fn points_table_rows(&self) -> usize {
        self.points_table_rows.unwrap_or(11)
    }

    pub fn result_columns(&self) -> Vec<String> {
        self.result_columns
            .clone()
            .unwrap_or_else(|| ["A", "B", "C", "F"].iter().map(|s| s.to_string()).collect())
    }

    pub fn available_points_columns(&self) -> Vec<String> {
        self.available_points_columns
            .clone()
            .unwrap_or_else(|| ('B'..='P').map(|c| c.to_string()).collect())
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SotwConfig {
    #[serde(rename = "roundSettings")]
    pub round_settings: RoundSettings,
    #[serde(rename = "submissionSource")]
    pub submission_source: Option<SubmissionSource>,
    #[serde(rename = "ballotSource")]
    pub ballot_source: Option<BallotSource>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub rules: Option<RulesConfig>,
    pub ledger: Option<LedgerConfig>,
}

impl SotwConfig {
    /// The configuration used when the inputs are only given on the command line.
    pub fn from_inputs() -> SotwConfig {
        SotwConfig {
            round_settings: RoundSettings {
                contest_name: "Song of the Week".to_string(),
                round_date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
                output_path: None,
            },
            submission_source: None,
            ballot_source: None,
            participants: Vec::new(),
            rules: None,
            ledger: None,
        }
    }

    pub fn round_date(&self) -> SotwResult<NaiveDate> {
        let date = self.round_settings.round_date.clone();
        NaiveDate::parse_from_str(&date, "%Y-%m-%d").context(InvalidDateSnafu { date })
    }
}

pub fn read_config(path: &str) -> SotwResult<SotwConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: SotwConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    info!("config: read {:?}", path);
    Ok(config)
}

fn house_candidate(rules: &RulesConfig) -> SotwResult<Option<HouseCandidate>> {
    let default_house = HouseCandidate::default();
    let weight = rules.house_weight.unwrap_or(default_house.weight);
    ensure!(
        weight.is_finite() && weight >= 0.0,
        InvalidConfigOptionSnafu {
            option: "houseWeight",
            value: weight.to_string(),
        }
    );
    if weight == 0.0 {
        return Ok(None);
    }
    Ok(Some(HouseCandidate {
        name: rules.house_candidate.clone().unwrap_or(default_house.name),
        weight,
    }))
}

fn rank_labels(config: &SotwConfig) -> SotwResult<RankLabels> {
    let labels = config
        .ballot_source
        .as_ref()
        .and_then(|s| s.rank_labels.clone());
    match labels.as_deref() {
        None => Ok(RankLabels::default()),
        Some([first, second, third]) => Ok(RankLabels {
            first: first.clone(),
            second: second.clone(),
            third: third.clone(),
        }),
        Some(x) => InvalidConfigOptionSnafu {
            option: "rankLabels",
            value: format!("{:?} (expected 3 labels)", x),
        }
        .fail(),
    }
}

/// Builds the scoring rules. A seed passed on the command line takes precedence over the
/// configured one.
pub fn validate_rules(config: &SotwConfig, seed_override: Option<u64>) -> SotwResult<ScoringRules> {
    let default_rules = RulesConfig {
        tiebreak_mode: "weightedRandom".to_string(),
        random_seed: None,
        pool_weight: None,
        house_candidate: None,
        house_weight: None,
    };
    let rules = config.rules.clone().unwrap_or(default_rules);

    let tiebreak_mode = match rules.tiebreak_mode.as_str() {
        "useSubmissionOrder" => TieBreakMode::UseSubmissionOrder,
        "weightedRandom" | "random" => {
            let pool_weight = rules
                .pool_weight
                .unwrap_or(ScoringRules::DEFAULT_POOL_WEIGHT);
            ensure!(
                pool_weight.is_finite() && pool_weight > 0.0,
                InvalidConfigOptionSnafu {
                    option: "poolWeight",
                    value: pool_weight.to_string(),
                }
            );
            TieBreakMode::WeightedRandom {
                pool_weight,
                house: house_candidate(&rules)?,
            }
        }
        x => {
            whatever!(
                "Cannot use tiebreak mode {:?} (currently not implemented)",
                x
            )
        }
    };

    let random_seed = seed_override.or_else(|| rules.random_seed.as_deref().map(seed_from_text));

    Ok(ScoringRules {
        tiebreak_mode,
        random_seed,
        rank_labels: rank_labels(config)?,
    })
}

pub fn read_summary(path: &str) -> SotwResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "roundSettings": { "contestName": "Song of the Week", "roundDate": "2022-08-12" },
        "submissionSource": { "provider": "playlist_json", "filePath": "playlist.json", "songCount": 9 },
        "ballotSource": { "provider": "google_forms", "filePath": "{date} responses.xlsx" },
        "participants": [
            { "name": "Ann", "usernames": ["ann_1987"], "ledgerColumn": "H" },
            { "name": "Ben" }
        ],
        "rules": { "tiebreakMode": "weightedRandom", "randomSeed": "1234", "houseCandidate": "David" },
        "ledger": { "directory": "ledger", "lastRow": 203 }
    }"#;

    fn config() -> SotwConfig {
        serde_json::from_str(CONFIG).unwrap()
    }

    #[test]
    fn parse_config() {
        let c = config();
        assert_eq!(
            c.round_date().unwrap(),
            NaiveDate::from_ymd_opt(2022, 8, 12).unwrap()
        );
        assert_eq!(c.participants.len(), 2);
        assert_eq!(c.participants[1].usernames, None);
        let ledger = c.ledger.unwrap();
        assert_eq!(ledger.points_table_rows(), 11);
        assert_eq!(ledger.result_columns(), vec!["A", "B", "C", "F"]);
        let cols = ledger.available_points_columns();
        assert_eq!(cols.len(), 15);
        assert_eq!(cols.first().map(|s| s.as_str()), Some("B"));
        assert_eq!(cols.last().map(|s| s.as_str()), Some("P"));
    }

    #[test]
    fn rules_from_config() {
        let rules = validate_rules(&config(), None).unwrap();
        assert_eq!(rules.random_seed, Some(1234));
        assert_eq!(
            rules.tiebreak_mode,
            TieBreakMode::WeightedRandom {
                pool_weight: 999.0,
                house: Some(HouseCandidate {
                    name: "David".to_string(),
                    weight: 1.0
                })
            }
        );
        assert_eq!(rules.rank_labels, RankLabels::default());

        let rules = validate_rules(&config(), Some(7)).unwrap();
        assert_eq!(rules.random_seed, Some(7));
    }

    #[test]
    fn house_can_be_disabled() {
        let mut c = config();
        if let Some(r) = c.rules.as_mut() {
            r.house_weight = Some(0.0);
        }
        let rules = validate_rules(&c, None).unwrap();
        assert_eq!(
            rules.tiebreak_mode,
            TieBreakMode::WeightedRandom {
                pool_weight: 999.0,
                house: None
            }
        );
    }

    #[test]
    fn invalid_weights() {
        for (pool, house) in [
            (Some(f64::INFINITY), None),
            (Some(f64::NAN), None),
            (Some(-1.0), None),
            (None, Some(-1.0)),
            (None, Some(f64::INFINITY)),
        ] {
            let mut c = config();
            if let Some(r) = c.rules.as_mut() {
                r.pool_weight = pool;
                r.house_weight = house;
            }
            assert!(
                matches!(
                    validate_rules(&c, None),
                    Err(SotwError::InvalidConfigOption { .. })
                ),
                "{:?} {:?}",
                pool,
                house
            );
        }
    }

    #[test]
    fn default_house_candidate() {
        let mut c = config();
        c.rules = None;
        let rules = validate_rules(&c, None).unwrap();
        assert_eq!(rules.tiebreak_mode, ScoringRules::default().tiebreak_mode);
        assert_eq!(rules.random_seed, None);
    }

    #[test]
    fn invalid_rules() {
        let mut c = config();
        if let Some(r) = c.rules.as_mut() {
            r.tiebreak_mode = "coinFlip".to_string();
        }
        assert!(validate_rules(&c, None).is_err());

        let mut c = config();
        if let Some(s) = c.ballot_source.as_mut() {
            s.rank_labels = Some(vec!["Gold".to_string(), "Silver".to_string()]);
        }
        assert!(matches!(
            validate_rules(&c, None),
            Err(SotwError::InvalidConfigOption { .. })
        ));

        let mut c = config();
        c.round_settings.round_date = "08/12/2022".to_string();
        assert!(matches!(
            c.round_date(),
            Err(SotwError::InvalidDate { .. })
        ));
    }

    #[test]
    fn custom_rank_labels() {
        let mut c = config();
        if let Some(s) = c.ballot_source.as_mut() {
            s.rank_labels = Some(vec![
                "Gold".to_string(),
                "Silver".to_string(),
                "Bronze".to_string(),
            ]);
        }
        let rules = validate_rules(&c, None).unwrap();
        assert_eq!(rules.rank_labels.parse("Silver"), Some(Rank::Second));
        assert_eq!(rules.rank_labels.parse("First Place"), None);
    }
}
