//! Raw CSV ingest.
//!
//! Reads the long-format tables published by statistical offices (one row
//! per region, age band and period) into `MortalityTable` /
//! `PopulationTable`.
//!
//! Expected columns (case-insensitive, any order, extra columns ignored):
//!
//! - `geo`: region code
//! - `age`: age band code (`Y35-39`) or label (`From 35 to 39 years`)
//! - `time`: `2020W05` for weekly mortality, `2020` for yearly population
//! - `value`: the count
//! - `sex` (optional): when present only totals (`T`/`Total`) are kept
//!
//! Design goals:
//! - **Strict schema** for required columns (clear error, exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;

use crate::domain::{
    AgeBand, MortalityRecord, MortalityTable, PopulationRecord, PopulationTable, Region, Week,
};
use crate::error::MortalityError;

/// Week code used for deaths whose week is unknown.
const UNKNOWN_WEEK: &str = "99";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the table plus bookkeeping about what was dropped.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub table: T,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows intentionally dropped (unknown week, missing value, non-total sex).
    pub rows_skipped: usize,
}

impl<T> Ingested<T> {
    /// Log row errors and hand back the table.
    pub fn into_table(self, source: &str) -> T {
        if !self.row_errors.is_empty() {
            log::warn!(
                "{source}: {} of {} rows rejected (first: line {}: {})",
                self.row_errors.len(),
                self.rows_read,
                self.row_errors[0].line,
                self.row_errors[0].message
            );
            for err in &self.row_errors {
                log::debug!("{source}: line {}: {}", err.line, err.message);
            }
        }
        log::info!(
            "{source}: {} rows read, {} skipped, {} rejected",
            self.rows_read,
            self.rows_skipped,
            self.row_errors.len()
        );
        self.table
    }
}

enum RowOutcome<T> {
    Keep(T),
    Skip,
}

pub fn load_mortality_csv(path: &Path) -> Result<Ingested<MortalityTable>, MortalityError> {
    read_mortality_csv(open(path)?)
}

pub fn load_population_csv(path: &Path) -> Result<Ingested<PopulationTable>, MortalityError> {
    read_population_csv(open(path)?)
}

pub fn read_mortality_csv<R: Read>(reader: R) -> Result<Ingested<MortalityTable>, MortalityError> {
    let ingested = read_rows(reader, |record, header_map| {
        let Some(fields) = common_fields(record, header_map)? else {
            return Ok(RowOutcome::Skip);
        };
        let (region, age, time, value) = fields;

        if time.split_once(['W', 'w']).is_some_and(|(_, week)| week == UNKNOWN_WEEK) {
            return Ok(RowOutcome::Skip);
        }
        let week: Week = time.parse().map_err(|e: MortalityError| e.to_string())?;

        Ok(RowOutcome::Keep(MortalityRecord {
            week,
            region,
            age,
            deaths: value,
        }))
    })?;

    Ok(Ingested {
        table: MortalityTable::new(ingested.table),
        row_errors: ingested.row_errors,
        rows_read: ingested.rows_read,
        rows_skipped: ingested.rows_skipped,
    })
}

pub fn read_population_csv<R: Read>(reader: R) -> Result<Ingested<PopulationTable>, MortalityError> {
    let ingested = read_rows(reader, |record, header_map| {
        let Some(fields) = common_fields(record, header_map)? else {
            return Ok(RowOutcome::Skip);
        };
        let (region, age, time, value) = fields;

        let year: i32 = time.parse().map_err(|_| format!("Invalid year '{time}'."))?;

        Ok(RowOutcome::Keep(PopulationRecord {
            year,
            region,
            age,
            population: value,
        }))
    })?;

    Ok(Ingested {
        table: PopulationTable::new(ingested.table),
        row_errors: ingested.row_errors,
        rows_read: ingested.rows_read,
        rows_skipped: ingested.rows_skipped,
    })
}

/// Write a mortality table in the raw long format (readable by `read_mortality_csv`).
pub fn write_mortality_csv<W: Write>(writer: W, table: &MortalityTable) -> Result<(), MortalityError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["geo", "age", "sex", "time", "value"])?;
    for r in table.records() {
        let time = format!("{}W{:02}", r.week.year(), r.week.week());
        out.write_record([
            r.region.as_str(),
            r.age.query_code().as_str(),
            "T",
            time.as_str(),
            format_value(r.deaths).as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Write a population table in the raw long format.
pub fn write_population_csv<W: Write>(writer: W, table: &PopulationTable) -> Result<(), MortalityError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["geo", "age", "sex", "time", "value"])?;
    for r in table.records() {
        out.write_record([
            r.region.as_str(),
            r.age.query_code().as_str(),
            "T",
            r.year.to_string().as_str(),
            format_value(r.population).as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

fn open(path: &Path) -> Result<File, MortalityError> {
    File::open(path).map_err(|e| MortalityError::invalid_input(format!("Failed to open CSV '{}': {e}", path.display())))
}

struct RawRows<T> {
    table: Vec<T>,
    row_errors: Vec<RowError>,
    rows_read: usize,
    rows_skipped: usize,
}

fn read_rows<R, T, F>(reader: R, mut parse: F) -> Result<RawRows<T>, MortalityError>
where
    R: Read,
    F: FnMut(&StringRecord, &HashMap<String, usize>) -> Result<RowOutcome<T>, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| MortalityError::invalid_input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in ["geo", "age", "time", "value"] {
        if !header_map.contains_key(column) {
            return Err(MortalityError::invalid_input(format!("Missing required column: `{column}`")));
        }
    }

    let mut out = RawRows {
        table: Vec::new(),
        row_errors: Vec::new(),
        rows_read: 0,
        rows_skipped: 0,
    };

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse(&record, &header_map) {
            Ok(RowOutcome::Keep(row)) => out.table.push(row),
            Ok(RowOutcome::Skip) => out.rows_skipped += 1,
            Err(message) => out.row_errors.push(RowError { line, message }),
        }
    }

    Ok(out)
}

/// `(region, age, time, value)` or `None` for rows that should be skipped.
fn common_fields<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<Option<(Region, AgeBand, &'a str, f64)>, String> {
    if let Some(sex) = get_optional(record, header_map, "sex") {
        if !(sex.eq_ignore_ascii_case("T") || sex.eq_ignore_ascii_case("total")) {
            return Ok(None);
        }
    }

    let Some(value) = parse_value(get_optional(record, header_map, "value")) else {
        return Ok(None);
    };
    if value < 0.0 {
        return Err(format!("Negative value {value}."));
    }

    let region = Region::new(get_required(record, header_map, "geo")?);
    let age = AgeBand::parse(get_required(record, header_map, "age")?).map_err(|e| e.to_string())?;
    let time = get_required(record, header_map, "time")?;

    Ok(Some((region, age, time, value)))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a published value. `:` marks "not available"; trailing flags such as
/// `p` (provisional) or `e` (estimated) are ignored.
fn parse_value(raw: Option<&str>) -> Option<f64> {
    let token = raw?.split_whitespace().next()?;
    if token == ":" {
        return None;
    }
    let v = token.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MORTALITY: &str = "\u{feff}GEO,age,sex,time,value\n\
        SE,Y35-39,T,2020W01,4\n\
        SE,From 35 to 39 years,T,2020W02,5 p\n\
        SE,Y35-39,M,2020W02,3\n\
        SE,Y35-39,T,2020W99,2\n\
        SE,Y35-39,T,2020W03,:\n\
        SE,Y_GE85,T,2020W03,9\n\
        SE,Y35-39,T,2020W60,1\n\
        AT,Y_LT5,T,2021W53,1\n";

    #[test]
    fn mortality_rows_are_validated_and_filtered() {
        let ingested = read_mortality_csv(MORTALITY.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 8);
        // Male row, week 99 and ':' are skipped on purpose.
        assert_eq!(ingested.rows_skipped, 3);
        // Unknown band, week 60 and 2021W53 are errors.
        assert_eq!(ingested.row_errors.len(), 3);

        let table = ingested.table;
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].deaths, 5.0);
        assert_eq!(table.records()[1].week, Week::from_iso(2020, 2).unwrap());
    }

    #[test]
    fn population_rows_parse_years() {
        let csv = "geo,age,time,value\nSE,Y_LT5,2019,580000\nSE,Y_LT5,20x9,1\n";
        let ingested = read_population_csv(csv.as_bytes()).unwrap();
        assert_eq!(ingested.table.len(), 1);
        assert_eq!(ingested.table.records()[0].year, 2019);
        assert_eq!(ingested.row_errors.len(), 1);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let err = read_mortality_csv("geo,age,value\nSE,Y_LT5,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MortalityError::InvalidInput { .. }));
    }

    #[test]
    fn written_tables_read_back() {
        let table = read_mortality_csv(MORTALITY.as_bytes()).unwrap().table;
        let mut buf = Vec::new();
        write_mortality_csv(&mut buf, &table).unwrap();

        let again = read_mortality_csv(buf.as_slice()).unwrap();
        assert!(again.row_errors.is_empty());
        assert_eq!(again.table, table);
    }
}
