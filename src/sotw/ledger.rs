// The results ledger: three tables stored as CSV files and addressed like a spreadsheet.

use std::path::{Path, PathBuf};

use regex::{Captures, Regex};

use crate::sotw::*;

pub const POINTS_CALCULATION: &str = "points_calculation.csv";
pub const ALL_TIME_RESULTS: &str = "all_time_results.csv";
pub const AVAILABLE_TOTAL_POINTS: &str = "available_total_points.csv";

const DATE_CELL_FORMAT: &str = "%-m/%-d/%Y";

const MAX_COLUMN_LETTERS: usize = 3;

/// Converts a column name (`A`, `Z`, `AA`) to a 0-based index. Names have at most 3 letters.
pub fn column_index(name: &str) -> SotwResult<usize> {
    let name = name.trim();
    ensure!(
        !name.is_empty()
            && name.len() <= MAX_COLUMN_LETTERS
            && name.chars().all(|c| c.is_ascii_alphabetic()),
        InvalidCellReferenceSnafu { reference: name }
    );
    let idx = name
        .to_ascii_uppercase()
        .bytes()
        .try_fold(0usize, |acc, b| {
            acc.checked_mul(26)?
                .checked_add((b - b'A' + 1) as usize)
        })
        .context(InvalidCellReferenceSnafu { reference: name })?;
    Ok(idx - 1)
}

/// A position in a table: 0-based column, 1-based row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
}

impl CellRef {
    pub fn parse(reference: &str) -> SotwResult<CellRef> {
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .context(InvalidCellReferenceSnafu { reference })?;
        let (letters, digits) = reference.split_at(split);
        let row = digits
            .parse::<usize>()
            .ok()
            .filter(|r| *r > 0)
            .context(InvalidCellReferenceSnafu { reference })?;
        Ok(CellRef {
            col: column_index(letters)?,
            row,
        })
    }
}

/// Matches the cell references of a formula (`B203`, `$H$203`, `c12`).
pub fn row_reference_regex() -> SotwResult<Regex> {
    Regex::new(r"(^|[^A-Za-z0-9_$])(\$?[A-Za-z]{1,3}\$?)([0-9]+)\b")
        .whatever_context("Could not build the cell reference pattern")
}

/// Moves the cell references of a formula pointing to `old_row` to `new_row`.
/// `=SUM(B2:B203)` becomes `=SUM(B2:B204)` when moving from 203 to 204.
pub fn shift_row_references(re: &Regex, value: &str, old_row: usize, new_row: usize) -> String {
    re.replace_all(value, |caps: &Captures| match caps[3].parse::<usize>() {
        Ok(r) if r == old_row => format!("{}{}{}", &caps[1], &caps[2], new_row),
        _ => caps[0].to_string(),
    })
    .into_owned()
}

/// A table loaded in memory. Writes go to memory until `save` is called.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Sheet {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Loads the table, or starts an empty one if the file does not exist yet.
    pub fn load(path: &Path) -> SotwResult<Sheet> {
        let p = path.display().to_string();
        let mut rows: Vec<Vec<String>> = Vec::new();
        if path.exists() {
            let rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)
                .context(CsvOpenSnafu { path: p.clone() })?;
            for line in rdr.into_records() {
                let line = line.context(CsvLineParseSnafu {})?;
                rows.push(line.iter().map(|s| s.to_string()).collect());
            }
            debug!("Sheet::load: {} rows in {:?}", rows.len(), p);
        } else {
            info!("Sheet::load: {:?} does not exist, starting an empty table", p);
        }
        Ok(Sheet {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn get(&self, cell: CellRef) -> &str {
        self.rows
            .get(cell.row - 1)
            .and_then(|r| r.get(cell.col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, cell: CellRef, value: &str) {
        if self.rows.len() < cell.row {
            self.rows.resize(cell.row, Vec::new());
        }
        let row = &mut self.rows[cell.row - 1];
        if row.len() <= cell.col {
            row.resize(cell.col + 1, String::new());
        }
        row[cell.col] = value.to_string();
    }

    /// Empties all the cells between two corners (inclusive).
    pub fn clear(&mut self, from: CellRef, to: CellRef) {
        for row in from.row..=to.row {
            for col in from.col..=to.col {
                if !self.get(CellRef { col, row }).is_empty() {
                    self.set(CellRef { col, row }, "");
                }
            }
        }
    }

    pub fn save(&self) -> SotwResult<()> {
        let p = self.path.display().to_string();
        let width = self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .context(CsvWriteSnafu { path: p.clone() })?;
        for row in self.rows.iter() {
            let mut padded = row.clone();
            padded.resize(width, String::new());
            wtr.write_record(&padded)
                .context(CsvWriteSnafu { path: p.clone() })?;
        }
        wtr.flush().context(WritingFileSnafu { path: p.clone() })?;
        debug!("Sheet::save: {} rows in {:?}", self.rows.len(), p);
        Ok(())
    }
}

/// The ledger stored as CSV files in a directory.
pub struct CsvLedger {
    directory: PathBuf,
    last_row: usize,
    points_table_rows: usize,
    result_columns: Vec<usize>,
    available_points_columns: Vec<usize>,
    participant_columns: Vec<(String, usize)>,
}

impl CsvLedger {
    pub fn new(
        root: &Path,
        config: &LedgerConfig,
        participants: &[Participant],
        date: NaiveDate,
    ) -> SotwResult<CsvLedger> {
        let directory = PathBuf::from(expand_path(root, &config.directory, date));
        ensure!(
            config.last_row > 0,
            InvalidConfigOptionSnafu {
                option: "lastRow",
                value: config.last_row.to_string(),
            }
        );
        let result_columns = config
            .result_columns()
            .iter()
            .map(|c| column_index(c))
            .collect::<SotwResult<Vec<usize>>>()?;
        let available_points_columns = config
            .available_points_columns()
            .iter()
            .map(|c| column_index(c))
            .collect::<SotwResult<Vec<usize>>>()?;
        let mut participant_columns: Vec<(String, usize)> = Vec::new();
        for p in participants.iter() {
            if let Some(c) = &p.ledger_column {
                participant_columns.push((p.name.clone(), column_index(c)?));
            }
        }
        Ok(CsvLedger {
            directory,
            last_row: config.last_row,
            points_table_rows: config.points_table_rows(),
            result_columns,
            available_points_columns,
            participant_columns,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn new_row(&self) -> usize {
        self.last_row + 1
    }

    /// Clears the scoring table and writes the scores of the round, starting on row 2.
    fn write_points_calculation(&self, entry: &LedgerEntry) -> SotwResult<()> {
        let mut sheet = Sheet::load(&self.directory.join(POINTS_CALCULATION))?;
        let last_table_row = 1 + self.points_table_rows;
        sheet.clear(
            CellRef::parse("A2")?,
            CellRef::parse(&format!("E{}", last_table_row))?,
        );
        if entry.scores.len() > self.points_table_rows {
            warn!(
                "write_points_calculation: {} rows do not fit in the table of {} rows",
                entry.scores.len() - self.points_table_rows,
                self.points_table_rows
            );
        }
        for (idx, r) in entry.scores.iter().take(self.points_table_rows).enumerate() {
            let row = idx + 2;
            let values = [
                r.submitter.clone(),
                r.first_count.to_string(),
                r.second_count.to_string(),
                r.third_count.to_string(),
                r.points.to_string(),
            ];
            for (col, v) in values.iter().enumerate() {
                sheet.set(CellRef { col, row }, v);
            }
        }
        sheet.save()
    }

    fn write_all_time_results(&self, entry: &LedgerEntry) -> SotwResult<()> {
        let mut sheet = Sheet::load(&self.directory.join(ALL_TIME_RESULTS))?;
        let row = self.new_row();
        let date = entry.date.format(DATE_CELL_FORMAT).to_string();
        let values = [
            date.clone(),
            entry.winner.clone(),
            entry.winning_song.clone(),
            date,
        ];
        for (col, v) in self.result_columns.iter().zip(values.iter()) {
            sheet.set(CellRef { col: *col, row }, v);
        }

        for (name, col) in self.participant_columns.iter() {
            match entry.points.iter().find(|(n, _)| n == name) {
                Some((_, points)) => sheet.set(CellRef { col: *col, row }, &points.to_string()),
                None => {
                    info!(
                        "write_all_time_results: {} did not take part in this round",
                        name
                    );
                    sheet.set(CellRef { col: *col, row }, "");
                }
            }
        }
        for (name, _) in entry.points.iter() {
            if !self.participant_columns.iter().any(|(n, _)| n == name) {
                warn!(
                    "write_all_time_results: {} has no ledger column, points not recorded",
                    name
                );
            }
        }
        sheet.save()
    }

    /// Carries the previous row forward, with its references moved to the new row.
    fn write_available_points(&self, entry: &LedgerEntry) -> SotwResult<()> {
        let mut sheet = Sheet::load(&self.directory.join(AVAILABLE_TOTAL_POINTS))?;
        let row = self.new_row();
        let re = row_reference_regex()?;
        sheet.set(
            CellRef { col: 0, row },
            &entry.date.format(DATE_CELL_FORMAT).to_string(),
        );
        for col in self.available_points_columns.iter() {
            let previous = sheet
                .get(CellRef {
                    col: *col,
                    row: self.last_row,
                })
                .to_string();
            if previous.is_empty() {
                debug!(
                    "write_available_points: empty cell in column {} of row {}",
                    col, self.last_row
                );
            }
            let shifted = shift_row_references(&re, &previous, self.last_row, row);
            sheet.set(CellRef { col: *col, row }, &shifted);
        }
        sheet.save()
    }
}

impl LedgerWriter for CsvLedger {
    type Error = SotwError;

    fn append(&mut self, entry: &LedgerEntry) -> SotwResult<()> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).context(WritingFileSnafu {
                path: self.directory.display().to_string(),
            })?;
        }
        info!(
            "append: {} won with {} ({} points given)",
            entry.winner, entry.winning_song, entry.total_points
        );
        self.write_points_calculation(entry)?;
        self.write_all_time_results(entry)?;
        self.write_available_points(entry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("h").unwrap(), 7);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert_eq!(column_index("AZ").unwrap(), 51);
        assert!(column_index("").is_err());
        assert!(column_index("A1").is_err());
        assert_eq!(column_index("ZZZ").unwrap(), 18277);
        assert!(matches!(
            column_index("ZZZZ"),
            Err(SotwError::InvalidCellReference { .. })
        ));
        assert!(matches!(
            column_index("ZZZZZZZZZZZZZZ"),
            Err(SotwError::InvalidCellReference { .. })
        ));
        assert!(CellRef::parse("ZZZZZZ2").is_err());
    }

    #[test]
    fn cell_references() {
        assert_eq!(
            CellRef::parse("B204").unwrap(),
            CellRef { col: 1, row: 204 }
        );
        assert!(CellRef::parse("B").is_err());
        assert!(CellRef::parse("B0").is_err());
        assert!(CellRef::parse("12").is_err());
    }

    #[test]
    fn shifted_references() {
        let re = row_reference_regex().unwrap();
        assert_eq!(
            shift_row_references(&re, "=SUM(B2:B203)", 203, 204),
            "=SUM(B2:B204)"
        );
        assert_eq!(
            shift_row_references(&re, "='All-Time Results'!$H$203*3+C203", 203, 204),
            "='All-Time Results'!$H$204*3+C204"
        );
        assert_eq!(shift_row_references(&re, "=b203+c2", 203, 204), "=b204+c2");
        assert_eq!(shift_row_references(&re, "=Sheet1!B1", 1, 2), "=Sheet1!B2");
        assert_eq!(shift_row_references(&re, "2030", 203, 204), "2030");
        assert_eq!(shift_row_references(&re, "", 203, 204), "");
    }

    #[test]
    fn sheet_set_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut sheet = Sheet::load(&path).unwrap();
        sheet.set(CellRef::parse("C3").unwrap(), "x");
        sheet.set(CellRef::parse("A1").unwrap(), "a, b");
        sheet.save().unwrap();

        let sheet = Sheet::load(&path).unwrap();
        assert_eq!(sheet.get(CellRef::parse("C3").unwrap()), "x");
        assert_eq!(sheet.get(CellRef::parse("A1").unwrap()), "a, b");
        assert_eq!(sheet.get(CellRef::parse("B2").unwrap()), "");
        assert_eq!(sheet.get(CellRef::parse("Z99").unwrap()), "");
    }

    fn entry() -> LedgerEntry {
        LedgerEntry {
            date: NaiveDate::from_ymd_opt(2022, 8, 12).unwrap(),
            winner: "Ben".to_string(),
            winning_song: "Bravo - Band B".to_string(),
            points: vec![
                ("Ann".to_string(), 5),
                ("Ben".to_string(), 6),
                ("Cat".to_string(), 1),
            ],
            total_points: 12,
            scores: vec![
                ScoreRow::new("Ben", 2, 0, 0),
                ScoreRow::new("Ann", 1, 1, 0),
                ScoreRow::new("Cat", 0, 0, 1),
            ],
        }
    }

    fn participants() -> Vec<Participant> {
        ["Ann:H", "Ben:I", "Dan:K"]
            .iter()
            .map(|s| {
                let (name, col) = s.split_once(':').unwrap();
                Participant {
                    name: name.to_string(),
                    usernames: None,
                    song_title: None,
                    ledger_column: Some(col.to_string()),
                }
            })
            .collect()
    }

    fn ledger_config(points_table_rows: usize) -> LedgerConfig {
        LedgerConfig {
            directory: "ledger".to_string(),
            last_row: 3,
            points_table_rows: Some(points_table_rows),
            result_columns: None,
            available_points_columns: Some(vec!["B".to_string(), "C".to_string()]),
        }
    }

    #[test]
    fn append_round() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("ledger");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(POINTS_CALCULATION),
            "submitter,first,second,third,points\nOld,1,1,1,6\nOlder,0,0,0,0\nOldest,0,0,0,0\n",
        )
        .unwrap();
        fs::write(
            dir.join(AVAILABLE_TOTAL_POINTS),
            "date,total,share\n8/5/2022,=SUM(B2:B2),=B3/C2\n8/12/2022,=SUM(B2:B3),=B3/C3\n",
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2022, 8, 12).unwrap();
        let mut ledger =
            CsvLedger::new(root.path(), &ledger_config(2), &participants(), date).unwrap();
        ledger.append(&entry()).unwrap();

        let points = Sheet::load(&dir.join(POINTS_CALCULATION)).unwrap();
        assert_eq!(points.get(CellRef::parse("A1").unwrap()), "submitter");
        assert_eq!(points.get(CellRef::parse("A2").unwrap()), "Ben");
        assert_eq!(points.get(CellRef::parse("E2").unwrap()), "6");
        assert_eq!(points.get(CellRef::parse("A3").unwrap()), "Ann");
        assert_eq!(points.get(CellRef::parse("C3").unwrap()), "1");
        // Only 2 rows in the table: Cat is dropped, the row below the table is untouched.
        assert_eq!(points.get(CellRef::parse("A4").unwrap()), "Oldest");

        let results = Sheet::load(&dir.join(ALL_TIME_RESULTS)).unwrap();
        assert_eq!(results.get(CellRef::parse("A4").unwrap()), "8/12/2022");
        assert_eq!(results.get(CellRef::parse("B4").unwrap()), "Ben");
        assert_eq!(results.get(CellRef::parse("C4").unwrap()), "Bravo - Band B");
        assert_eq!(results.get(CellRef::parse("F4").unwrap()), "8/12/2022");
        assert_eq!(results.get(CellRef::parse("H4").unwrap()), "5");
        assert_eq!(results.get(CellRef::parse("I4").unwrap()), "6");
        assert_eq!(results.get(CellRef::parse("K4").unwrap()), "");
        assert_eq!(results.get(CellRef::parse("A3").unwrap()), "");

        let available = Sheet::load(&dir.join(AVAILABLE_TOTAL_POINTS)).unwrap();
        assert_eq!(available.get(CellRef::parse("A4").unwrap()), "8/12/2022");
        assert_eq!(available.get(CellRef::parse("B4").unwrap()), "=SUM(B2:B4)");
        assert_eq!(available.get(CellRef::parse("C4").unwrap()), "=B4/C4");
        assert_eq!(available.get(CellRef::parse("B3").unwrap()), "=SUM(B2:B3)");
    }

    #[test]
    fn rewriting_a_round_overwrites_it() {
        let root = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2022, 8, 12).unwrap();
        let mut ledger =
            CsvLedger::new(root.path(), &ledger_config(11), &participants(), date).unwrap();
        ledger.append(&entry()).unwrap();
        let mut second = entry();
        second.winner = "Ann".to_string();
        ledger.append(&second).unwrap();

        let results = Sheet::load(&root.path().join("ledger").join(ALL_TIME_RESULTS)).unwrap();
        assert_eq!(results.get(CellRef::parse("B4").unwrap()), "Ann");
        assert_eq!(results.get(CellRef::parse("B5").unwrap()), "");
        let points = Sheet::load(&root.path().join("ledger").join(POINTS_CALCULATION)).unwrap();
        assert_eq!(points.get(CellRef::parse("A4").unwrap()), "Cat");
        assert_eq!(points.get(CellRef::parse("A5").unwrap()), "");
    }

    #[test]
    fn invalid_ledger_columns() {
        let mut c = ledger_config(11);
        c.result_columns = Some(vec!["A1".to_string()]);
        let date = NaiveDate::from_ymd_opt(2022, 8, 12).unwrap();
        assert!(matches!(
            CsvLedger::new(Path::new("."), &c, &[], date),
            Err(SotwError::InvalidCellReference { .. })
        ));
    }
}
