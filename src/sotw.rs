use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use sotw_scoring::builder::Builder;
use sotw_scoring::*;

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sotw::config_reader::*;
use crate::sotw::io_common::*;
use crate::sotw::ledger::CsvLedger;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_forms;
mod io_playlist;
mod ledger;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SotwError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Empty Excel file or worksheet"))]
    EmptyExcel {},
    #[snafu(display("Excel file {path}: could not find worksheet {name}"))]
    ExcelMissingWorksheet { path: String, name: String },
    #[snafu(display("Excel file {path} has several worksheets, set excelWorksheetName"))]
    ExcelTooManyWorksheets { path: String },
    #[snafu(display("Excel file: unexpected cell in line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Could not find column {column_name} in the header"))]
    MissingHeaderColumn { column_name: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV file {path} has no header"))]
    CsvMissingHeader { path: String },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Invalid date {date:?}, expected YYYY-MM-DD"))]
    InvalidDate {
        source: chrono::ParseError,
        date: String,
    },
    #[snafu(display("Missing configuration option {option}"))]
    MissingConfigOption { option: String },
    #[snafu(display("Invalid configuration option {option}: {value}"))]
    InvalidConfigOption { option: String, value: String },
    #[snafu(display("Invalid cell reference {reference:?}"))]
    InvalidCellReference { reference: String },
    #[snafu(display("Scoring error: {source}"))]
    Scoring { source: ScoringErrors },
    #[snafu(display("Some songs do not appear on the ballots: {songs}"))]
    MissingBallotColumns { songs: String },
    #[snafu(display("The ballots and the submissions do not match"))]
    MismatchedColumns {},
    #[snafu(display(
        "The house candidate {name} was drawn with seed {seed}: no winner, rerun with another seed"
    ))]
    HouseDrawn { name: String, seed: u64 },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SotwResult<T> = Result<T, SotwError>;

fn score_rows_to_json(rows: &[ScoreRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| {
            json!({
                "submitter": r.submitter,
                "firstPlace": r.first_count,
                "secondPlace": r.second_count,
                "thirdPlace": r.third_count,
                "points": r.points,
            })
        })
        .collect()
}

fn draw_to_json(draw: &TiebreakDraw) -> JSValue {
    let entries: Vec<JSValue> = draw
        .entries
        .iter()
        .map(|e| json!({"name": e.name, "weight": e.weight, "cumulative": e.cumulative}))
        .collect();
    json!({
        "seed": draw.seed.to_string(),
        "value": draw.value,
        "entries": entries,
        "selected": draw.entries.get(draw.selected).map(|e| e.name.clone()),
    })
}

fn outcome_to_json(outcome: &Outcome) -> JSValue {
    match outcome {
        Outcome::Winner { submitter, song } => {
            json!({"type": "winner", "winner": submitter, "song": song})
        }
        Outcome::TiebreakWinner {
            submitter,
            song,
            draw,
        } => json!({
            "type": "tiebreakWinner",
            "winner": submitter,
            "song": song,
            "draw": draw.as_ref().map(draw_to_json),
        }),
        Outcome::HouseDrawn { name, draw } => json!({
            "type": "houseDrawn",
            "houseCandidate": name,
            "draw": draw_to_json(draw),
        }),
    }
}

fn build_summary_js(config: &SotwConfig, seed: u64, result: &RoundResult) -> JSValue {
    json!({
        "config": {
            "contest": config.round_settings.contest_name,
            "date": result.date.format("%Y-%m-%d").to_string(),
            "seed": seed.to_string(),
        },
        "results": {
            "scores": score_rows_to_json(&result.scores),
            "maxPoints": result.max_points,
            "winnerCount": result.winner_count,
            "tied": result.tied,
            "outcome": outcome_to_json(&result.outcome),
            "totalPoints": result.total_points(),
        }
    })
}

fn print_scores(result: &RoundResult) {
    println!(
        "{:<24} {:>6} {:>6} {:>6} {:>6}",
        "submitter", "first", "second", "third", "points"
    );
    for r in result.scores.iter() {
        println!(
            "{:<24} {:>6} {:>6} {:>6} {:>6}",
            r.submitter, r.first_count, r.second_count, r.third_count, r.points
        );
    }
    println!("total points: {}", result.total_points());
    match &result.outcome {
        Outcome::Winner { submitter, song } => {
            println!("Winner = {}\nWinning Song = {}", submitter, song);
        }
        Outcome::TiebreakWinner {
            submitter, song, ..
        } => {
            println!("Winners = {}", result.tied.join(", "));
            println!(
                "Tiebreak Winner = {}\nTiebreak Winning Song = {}",
                submitter, song
            );
        }
        Outcome::HouseDrawn { name, .. } => {
            println!("Winners = {}", result.tied.join(", "));
            println!("Tiebreak drew the house candidate {}: no winner", name);
        }
    }
}

fn print_report(report: &ColumnReport) {
    for l in report.unmatched_labels.iter() {
        println!("ballot column without submission: {}", l);
    }
    for l in report.missing_submissions.iter() {
        println!("submission without ballot column: {}", l);
    }
    if report.is_clean() {
        println!("All the ballot columns match the submissions.");
    }
}

fn read_round_inputs(
    args: &Args,
    config: &SotwConfig,
    root: &Path,
    date: NaiveDate,
) -> SotwResult<(Vec<Submission>, BallotTable)> {
    let submissions = match (&args.submissions, &config.submission_source) {
        (Some(p), _) => io_csv::read_csv_submissions(p)?,
        (None, Some(source)) => {
            let p = expand_path(root, &source.file_path, date);
            info!("Attempting to read submissions file {:?}", p);
            match source.provider.as_str() {
                "playlist_json" => io_playlist::read_playlist_json(&p, source, &config.participants)?,
                "csv" => io_csv::read_csv_submissions(&p)?,
                x => whatever!("Submission provider not implemented {:?}", x),
            }
        }
        (None, None) => {
            return MissingConfigOptionSnafu {
                option: "submissionSource",
            }
            .fail()
        }
    };

    let voter_column = config
        .ballot_source
        .as_ref()
        .and_then(|s| s.voter_column.clone());
    let table = match (&args.ballots, &config.ballot_source) {
        (Some(p), _) => io_csv::read_csv_ballots(p, voter_column.as_deref())?,
        (None, Some(source)) => {
            let p = expand_path(root, &source.file_path, date);
            info!("Attempting to read ballots file {:?}", p);
            match source.provider.as_str() {
                "google_forms" => io_forms::read_forms_ballots(&p, source)?,
                "csv" => io_csv::read_csv_ballots(&p, voter_column.as_deref())?,
                x => whatever!("Ballot provider not implemented {:?}", x),
            }
        }
        (None, None) => {
            return MissingConfigOptionSnafu {
                option: "ballotSource",
            }
            .fail()
        }
    };
    Ok((submissions, table))
}

fn write_summary(out: &str, pretty_js: &str) -> SotwResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
    } else {
        info!("Writing summary to {:?}", out);
        fs::write(out, pretty_js).context(WritingFileSnafu { path: out })?;
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> SotwResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

pub fn run_round(args: &Args) -> SotwResult<()> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (SotwConfig::from_inputs(), Default::default()),
    };
    debug!("config: {:?}", config);
    let date = config.round_date()?;
    info!(
        "Running round {:?} of {:?}",
        date, config.round_settings.contest_name
    );

    let (submissions, table) = read_round_inputs(args, &config, &root, date)?;
    info!(
        "Read {} submissions and {} ballots",
        submissions.len(),
        table.ballots.len()
    );

    let report = check_ballot_columns(&submissions, &table.labels);
    if args.check {
        print_report(&report);
        ensure!(report.is_clean(), MismatchedColumnsSnafu {});
        return Ok(());
    }
    for l in report.unmatched_labels.iter() {
        warn!("Ballot column without submission, ignored: {:?}", l);
    }
    for l in report.missing_submissions.iter() {
        warn!("Submission without ballot column: {:?}", l);
    }

    let rules = validate_rules(&config, args.seed)?;
    let seed = rules.random_seed.unwrap_or_else(|| default_seed(date));
    let mut builder = Builder::new(&rules)
        .context(ScoringSnafu {})?
        .submissions(&submissions)
        .context(ScoringSnafu {})?;
    for pb in table.ballots.iter() {
        let choices: Vec<(String, String)> = table
            .labels
            .iter()
            .cloned()
            .zip(pb.choices.iter().cloned())
            .collect();
        builder
            .add_ballot_simple(&pb.voter, &choices)
            .context(ScoringSnafu {})?;
    }
    let result = builder.run(date).context(ScoringSnafu {})?;
    print_scores(&result);

    let result_js = build_summary_js(&config, seed, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;
    let out = args
        .out
        .clone()
        .or_else(|| config.round_settings.output_path.clone());
    if let Some(out) = out {
        write_summary(&out, &pretty_js_stats)?;
    }
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    if let Outcome::HouseDrawn { name, draw } = &result.outcome {
        return HouseDrawnSnafu {
            name: name.clone(),
            seed: draw.seed,
        }
        .fail();
    }

    match (&config.ledger, args.dry_run) {
        (_, true) => {
            info!("Dry run: the ledger is not updated");
        }
        (None, false) => {
            info!("No ledger configured");
        }
        (Some(ledger_config), false) => {
            if !report.missing_submissions.is_empty() && !args.force {
                return MissingBallotColumnsSnafu {
                    songs: report.missing_submissions.join("; "),
                }
                .fail();
            }
            let entry = ledger_entry(&result).context(ScoringSnafu {})?;
            let mut ledger = CsvLedger::new(&root, ledger_config, &config.participants, date)?;
            ledger.append(&entry)?;
            info!(
                "Ledger updated on row {} in {:?}",
                ledger_config.last_row + 1,
                ledger.directory()
            );
        }
    }
    Ok(())
}
