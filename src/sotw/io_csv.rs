// Primitives for reading CSV files.

use serde::Deserialize;

use crate::sotw::{io_common::*, *};

#[derive(Debug, Deserialize)]
struct SubmissionRecord {
    title: String,
    artists: String,
    submitter: String,
}

/// Reads submissions from a CSV file with the header `title,artists,submitter`.
pub fn read_csv_submissions(path: &str) -> SotwResult<Vec<Submission>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut res: Vec<Submission> = Vec::new();
    for record in rdr.deserialize() {
        let r: SubmissionRecord = record.context(CsvLineParseSnafu {})?;
        debug!("read_csv_submissions: {:?}", r);
        res.push(Submission::new(&r.title, &r.artists, &r.submitter));
    }
    Ok(res)
}

/// Reads ballots from a CSV file.
///
/// The first line is the header. The voter column is `voter_column` if provided, or the
/// column named `voter` if there is one. All the other columns are songs.
pub fn read_csv_ballots(path: &str, voter_column: Option<&str>) -> SotwResult<BallotTable> {
    let default_id = make_default_id(path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line) => line
            .context(CsvLineParseSnafu {})?
            .iter()
            .map(|s| s.trim().to_string())
            .collect(),
        None => return CsvMissingHeaderSnafu { path }.fail(),
    };
    debug!("read_csv_ballots: header: {:?}", header);

    let voter_idx: Option<usize> = match voter_column {
        Some(name) => Some(
            header
                .iter()
                .position(|h| h == name)
                .context(MissingHeaderColumnSnafu { column_name: name })?,
        ),
        None => header.iter().position(|h| h == "voter"),
    };
    let song_cols: Vec<usize> = (0..header.len()).filter(|i| Some(*i) != voter_idx).collect();
    let labels: Vec<String> = song_cols.iter().map(|i| header[*i].clone()).collect();

    let mut ballots: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let voter = voter_idx
            .and_then(|i| line.get(i))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_id(lineno));
        let choices: Vec<String> = song_cols
            .iter()
            .map(|i| line.get(*i).unwrap_or("").trim().to_string())
            .collect();
        debug!(
            "read_csv_ballots: lineno: {:?} voter: {:?} choices: {:?}",
            lineno, voter, choices
        );
        ballots.push(ParsedBallot { voter, choices });
    }
    Ok(BallotTable { labels, ballots })
}
