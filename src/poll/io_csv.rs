// Primitives for reading CSV ballot files.

use std::io::Read;

use crate::poll::{config_reader::ParsedBallot, io_common::*, *};

/// Reads the ballots of a CSV file: `voter, castTime, viewableTime, rank...`.
pub fn read_csv_ballots(path: String, cfs: &FileSource) -> PollResult<Vec<ParsedBallot>> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;
    read_ballots(rdr, first_row)
}

/// Reads ballots from any CSV reader without headers.
///
/// If `first_row` is not given, a first line whose cast time is filled with
/// something else than a number is taken as a header.
pub fn read_ballots<R: Read>(
    rdr: csv::Reader<R>,
    first_row: Option<usize>,
) -> PollResult<Vec<ParsedBallot>> {
    let mut res: Vec<ParsedBallot> = Vec::new();
    // The index starts at 1 to respect most conventions in the spreadsheet world
    let skipped = first_row.unwrap_or(1).saturating_sub(1);
    for (idx, line_r) in rdr.into_records().enumerate().skip(skipped) {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_ballots: lineno: {:?} row: {:?}", lineno, line);
        if line.len() < 3 {
            return CsvLineTooShortSnafu { lineno }.fail();
        }
        let cast_cell = line.get(1).unwrap_or_default();
        let cast_time = match parse_time(cast_cell) {
            Some(Some(t)) => t,
            None if first_row.is_none() && idx == 0 => {
                debug!("read_ballots: skipping header {:?}", line);
                continue;
            }
            _ => {
                return CsvTimeSnafu {
                    lineno,
                    value: cast_cell.to_string(),
                }
                .fail();
            }
        };
        let viewable_cell = line.get(2).unwrap_or_default();
        let viewable_time = parse_time(viewable_cell).context(CsvTimeSnafu {
            lineno,
            value: viewable_cell.to_string(),
        })?;
        res.push(ParsedBallot {
            voter: line.get(0).unwrap_or_default().trim().to_string(),
            ordering: line.iter().skip(3).map(parse_rank).collect(),
            cast_time,
            viewable_time,
        });
    }
    Ok(res)
}
