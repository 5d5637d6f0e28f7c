use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// A ballot, as parsed by the readers.
/// The choices are the raw content of the cells, in the order of the labels of the table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub voter: String,
    pub choices: Vec<String>,
}

/// All the ballots of a round, with the song label of each column.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotTable {
    pub labels: Vec<String>,
    pub ballots: Vec<ParsedBallot>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Resolves a path of the configuration: relative to the directory of the configuration
/// file, with `{date}` replaced by the date of the round.
pub fn expand_path(root: &Path, file_path: &str, date: NaiveDate) -> String {
    let with_date = file_path.replace("{date}", &date.format("%Y.%m.%d").to_string());
    let p: PathBuf = root.join(with_date);
    p.as_path().display().to_string()
}

/// Extracts the song from the header of a forms grid column:
/// `Which songs? (pick 3) ["Alpha" - Band A]` gives `"Alpha" - Band A`.
pub fn grid_label(header: &str) -> Option<String> {
    let inner = header.trim().strip_suffix(']')?;
    let start = match inner.find(") [") {
        Some(idx) => idx + 3,
        None => inner.rfind('[')? + 1,
    };
    let label = inner[start..].trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
