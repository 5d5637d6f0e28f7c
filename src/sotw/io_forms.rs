use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::sotw::{io_common::*, *};

/// Reads the Excel export of a Google Forms multiple choice grid.
///
/// Every grid column becomes a song label. The cells are expected to be the rank labels
/// or empty.
pub fn read_forms_ballots(path: &str, source: &BallotSource) -> SotwResult<BallotTable> {
    let default_id = make_default_id(path);
    let wrange = get_range(path, source)?;

    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_forms_ballots: header: {:?}", header);
    let header_names: Vec<Option<String>> = header
        .iter()
        .map(|dt| match dt {
            DataType::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();

    let song_cols: Vec<(usize, String)> = header_names
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| h.as_deref().and_then(grid_label).map(|l| (idx, l)))
        .collect();
    debug!("read_forms_ballots: song columns: {:?}", song_cols);
    if song_cols.is_empty() {
        whatever!("No grid question found in the header of {}", path);
    }

    let voter_idx: Option<usize> = match &source.voter_column {
        Some(name) => Some(
            header_names
                .iter()
                .position(|h| h.as_deref() == Some(name.as_str()))
                .context(MissingHeaderColumnSnafu {
                    column_name: name.clone(),
                })?,
        ),
        None => None,
    };

    let mut ballots: Vec<ParsedBallot> = Vec::new();
    // The first row is the header.
    for (idx, row) in wrange.rows().enumerate().skip(1) {
        let lineno = idx + 1;
        if row.iter().all(|c| matches!(c, DataType::Empty)) {
            debug!("read_forms_ballots: skipping empty line {}", lineno);
            continue;
        }
        let mut choices: Vec<String> = Vec::new();
        for (col_idx, _) in song_cols.iter() {
            match row.get(*col_idx) {
                Some(DataType::String(s)) => choices.push(s.trim().to_string()),
                Some(DataType::Empty) | None => choices.push("".to_string()),
                Some(v) => {
                    return ExcelWrongCellTypeSnafu {
                        lineno: lineno as u64,
                        content: format!("{:?} IN {:?}", v, row),
                    }
                    .fail();
                }
            }
        }
        let voter = voter_idx
            .and_then(|i| row.get(i))
            .filter(|c| !matches!(c, DataType::Empty))
            .map(|c| c.to_string())
            .unwrap_or_else(|| default_id(lineno));
        debug!(
            "read_forms_ballots: lineno: {:?} voter: {:?} choices: {:?}",
            lineno, voter, choices
        );
        ballots.push(ParsedBallot { voter, choices });
    }

    Ok(BallotTable {
        labels: song_cols.into_iter().map(|(_, l)| l).collect(),
        ballots,
    })
}

fn get_range(path: &str, source: &BallotSource) -> SotwResult<calamine::Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(ExcelMissingWorksheetSnafu {
                path,
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu {}.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "get_range: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => ExcelTooManyWorksheetsSnafu { path }.fail(),
        }
    }
}
