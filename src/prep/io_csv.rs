// Primitives for reading and writing roster CSV files.

use std::path::Path;

use log::debug;
use snafu::prelude::*;

use roster_cleaning::Voter;

use crate::prep::{
    CsvFlushSnafu, CsvLineParseSnafu, CsvOpenSnafu, CsvWriteSnafu, InputNotFoundSnafu, PrepResult,
};

/// Header of the voter-upload schema. The matric column keeps its roster
/// spelling, the rest is what the upload tool expects.
pub const VOTER_HEADER: [&str; 5] = ["first_name", "last_name", "email", "level", "Matric No"];

/// An in-memory roster: the header record plus all the data rows.
pub struct RosterTable {
    pub header: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl RosterTable {
    /// Position of the named column in the header, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }
}

pub fn read_roster(path: &str) -> PrepResult<RosterTable> {
    ensure!(Path::new(path).is_file(), InputNotFoundSnafu { path });
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header = rdr.headers().context(CsvOpenSnafu { path })?.clone();
    debug!("read_roster: header: {:?}", header);

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for line_r in rdr.into_records() {
        let line = line_r.context(CsvLineParseSnafu {})?;
        rows.push(line);
    }
    debug!("read_roster: {} rows read from {}", rows.len(), path);
    Ok(RosterTable { header, rows })
}

pub fn write_roster(
    path: &str,
    header: &csv::StringRecord,
    rows: &[csv::StringRecord],
) -> PrepResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    wtr.write_record(header).context(CsvWriteSnafu { path })?;
    for row in rows {
        wtr.write_record(row).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(CsvFlushSnafu { path })?;
    Ok(())
}

pub fn write_voters(path: &str, voters: &[Voter]) -> PrepResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvOpenSnafu { path })?;
    wtr.write_record(VOTER_HEADER).context(CsvWriteSnafu { path })?;
    for v in voters {
        wtr.write_record([
            v.first_name.as_str(),
            v.last_name.as_str(),
            v.email.as_str(),
            v.level.as_str(),
            v.matric_no.as_str(),
        ])
        .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(CsvFlushSnafu { path })?;
    Ok(())
}
