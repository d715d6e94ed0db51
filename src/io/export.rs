//! Export excess results to JSON (chart payload) and CSV (one row per week).
//!
//! The JSON mirrors what a chart front end consumes: parallel arrays keyed by
//! series name, values rounded for display. The CSV keeps full precision and
//! is meant for spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::MortalityError;
use crate::report::{ExcessReport, WeeklyChartFile};

/// Write the weekly chart payload to `path`.
pub fn write_excess_json(path: &Path, report: &ExcessReport) -> Result<(), MortalityError> {
    write_json(create(path)?, &WeeklyChartFile::from_report(report))
}

/// Write per-week results to `path`.
pub fn write_excess_csv(path: &Path, report: &ExcessReport) -> Result<(), MortalityError> {
    write_excess_rows(create(path)?, report)
}

/// Pretty-printed JSON of any chart payload.
pub fn write_json<W: Write, T: Serialize>(writer: W, payload: &T) -> Result<(), MortalityError> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, payload).map_err(std::io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_excess_rows<W: Write>(writer: W, report: &ExcessReport) -> Result<(), MortalityError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["region", "week", "unit", "actual", "expected", "excess"])?;

    let region = report.region.as_str();
    let unit = report.measure.unit_label();
    for p in &report.points {
        let week = p.week.to_string();
        let actual = format!("{:.4}", p.actual);
        let expected = p.expected.map(|v| format!("{v:.4}")).unwrap_or_default();
        let excess = p.excess().map(|v| format!("{v:.4}")).unwrap_or_default();
        out.write_record([region, week.as_str(), unit, actual.as_str(), expected.as_str(), excess.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File, MortalityError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
        .map_err(|e| MortalityError::invalid_input(format!("Failed to create export '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeBand, Measure, Region, Week};
    use crate::report::ExcessPoint;

    fn report() -> ExcessReport {
        ExcessReport {
            region: Region::new("DK"),
            ages: vec![AgeBand::parse("Y80-84").unwrap()],
            measure: Measure::Deaths,
            lookback_years: 5,
            from_year: None,
            points: vec![
                ExcessPoint {
                    week: Week::from_iso(2020, 10).unwrap(),
                    actual: 12.0,
                    expected: Some(10.5),
                },
                ExcessPoint {
                    week: Week::from_iso(2020, 11).unwrap(),
                    actual: 9.0,
                    expected: None,
                },
            ],
        }
    }

    #[test]
    fn csv_rows_leave_gaps_empty() {
        let mut buf = Vec::new();
        write_excess_rows(&mut buf, &report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "region,week,unit,actual,expected,excess\n\
             DK,2020-W10,deaths,12.0000,10.5000,1.5000\n\
             DK,2020-W11,deaths,9.0000,,\n"
        );
    }

    #[test]
    fn json_payload_has_chart_keys() {
        let mut buf = Vec::new();
        write_json(&mut buf, &WeeklyChartFile::from_report(&report())).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let weekly = &value["weekly_data"];
        assert_eq!(weekly["label"], serde_json::json!(["2020/10", "2020/11"]));
        assert_eq!(weekly["deaths"], serde_json::json!([12.0, 9.0]));
        assert_eq!(weekly["expected_deaths"][1], serde_json::Value::Null);
        assert_eq!(weekly["above_expectation_deaths"], serde_json::json!([2.0, 0.0]));
        assert_eq!(value["ages"], serde_json::json!(["Y80-84"]));
        assert_eq!(value["unit"], "deaths");
    }

    #[test]
    fn export_files_are_created_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let json = tmp.path().join("out/nested/excess.json");
        let csv = tmp.path().join("out/excess.csv");
        write_excess_json(&json, &report()).unwrap();
        write_excess_csv(&csv, &report()).unwrap();
        assert!(json.is_file());
        assert!(csv.is_file());
    }
}
