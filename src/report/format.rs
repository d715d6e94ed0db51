//! Terminal formatting for excess reports, yearly totals and sweeps.
//!
//! All output is built as `String`s so it can be asserted on in tests.

use crate::domain::{AgeBand, Measure, YearlySeries};
use crate::report::{ExcessPoint, ExcessReport, SweepRow};

/// Header block: selection, forecast settings and totals.
pub fn format_excess_summary(report: &ExcessReport) -> String {
    let mut out = String::new();
    let unit = report.measure.unit_label();
    let decimals = report.measure.display_decimals() as usize;

    out.push_str("=== mortality - Excess Mortality ===\n");
    out.push_str(&format!("Region: {}\n", report.region));
    out.push_str(&format!("Ages: {}\n", fmt_ages(&report.ages)));
    out.push_str(&format!("Unit: {unit}\n"));
    out.push_str(&format!("Lookback: {} years\n", report.lookback_years));

    match (report.points.first(), report.points.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Weeks: n={} | {} .. {}\n", report.points.len(), first.week, last.week));
        }
        _ => out.push_str("Weeks: n=0\n"),
    }
    if report.gap_count() > 0 {
        out.push_str(&format!("Gaps: {} week(s) without a forecast\n", report.gap_count()));
    }

    out.push_str("\nTotals:\n");
    out.push_str(&format!("- excess: {:.*}\n", decimals, report.total_excess()));
    out.push_str(&format!("- above expectation: {:.*}\n", decimals, report.total_above()));
    out.push_str(&format!("- below expectation: {:.*}\n", decimals, report.total_below()));
    if let Some(peak) = report.peak() {
        out.push_str(&format!("- peak week: {} (+{:.*})\n", peak.week, decimals, peak.above()));
    }
    out.push('\n');

    out
}

/// Week-by-week table of actual, expected and excess.
pub fn format_weekly_table(points: &[ExcessPoint], measure: Measure) -> String {
    let decimals = measure.display_decimals() as usize;
    let mut out = String::new();

    out.push_str(&format!("{:<10} {:>12} {:>12} {:>12}", "week", "actual", "expected", "excess"));
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<12} {:-<12} {:-<12}", "", "", "", ""));
    out.push('\n');

    for p in points {
        let expected = p.expected.map(|v| format!("{v:.decimals$}")).unwrap_or_else(|| "-".to_string());
        let excess = p.excess().map(|v| format!("{v:+.decimals$}")).unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:<10} {:>12.*} {:>12} {:>12}",
                p.week.to_string(),
                decimals,
                p.actual,
                expected,
                excess
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Yearly totals up to `max_week`, with the change against the previous year.
pub fn format_yearly_table(totals: &YearlySeries, max_week: u32, measure: Measure) -> String {
    let decimals = measure.display_decimals() as usize;
    let mut out = String::new();

    out.push_str(&format!("Totals through week {max_week} ({}):\n", measure.unit_label()));
    out.push_str(&format!("{:<6} {:>14} {:>9}", "year", "total", "change"));
    out.push('\n');
    out.push_str(&format!("{:-<6} {:-<14} {:-<9}", "", "", ""));
    out.push('\n');

    let mut prev: Option<f64> = None;
    for (year, total) in totals.iter() {
        let change = prev
            .filter(|p| *p > 0.0)
            .map(|p| format!("{:+.1}%", (total / p - 1.0) * 100.0))
            .unwrap_or_default();
        out.push_str(format!("{year:<6} {total:>14.decimals$} {change:>9}").trim_end());
        out.push('\n');
        prev = Some(total);
    }

    out
}

/// Sweep results, largest excess first.
pub fn format_sweep(rows: &[SweepRow]) -> String {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.total_excess.partial_cmp(&a.total_excess).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:<10} {:>8} {:>12} {:>12} {:>12} {:>6}",
        "region", "ages", "lookback", "excess", "above", "below", "gaps"
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:-<8} {:-<10} {:-<8} {:-<12} {:-<12} {:-<12} {:-<6}",
        "", "", "", "", "", "", ""
    ));
    out.push('\n');

    for r in &sorted {
        out.push_str(&format!(
            "{:<8} {:<10} {:>8} {:>12.0} {:>12.0} {:>12.0} {:>6}",
            truncate(r.region.as_str(), 8),
            truncate(&r.ages, 10),
            r.lookback_years,
            r.total_excess,
            r.total_above,
            r.total_below,
            r.gaps
        ));
        out.push('\n');
    }

    out
}

fn fmt_ages(ages: &[AgeBand]) -> String {
    match (ages.first(), ages.last()) {
        (Some(first), Some(last)) if ages.len() > 3 => {
            format!("{} .. {} ({} bands)", first.query_code(), last.query_code(), ages.len())
        }
        _ => ages.iter().map(|a| a.query_code()).collect::<Vec<_>>().join(", "),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeGroup, Region, Week};

    fn week(year: i32, w: u32) -> Week {
        Week::from_iso(year, w).unwrap()
    }

    #[test]
    fn weekly_table_marks_gaps() {
        let points = vec![
            ExcessPoint {
                week: week(2020, 14),
                actual: 130.0,
                expected: Some(100.0),
            },
            ExcessPoint {
                week: week(2020, 15),
                actual: 90.0,
                expected: None,
            },
        ];
        let txt = format_weekly_table(&points, Measure::Deaths);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "2020-W14            130          100          +30");
        assert_eq!(lines[3], "2020-W15             90            -            -");
    }

    #[test]
    fn yearly_table_shows_change() {
        let totals: YearlySeries = [(2019, 100.0), (2020, 110.0)].into_iter().collect();
        let txt = format_yearly_table(&totals, 12, Measure::Deaths);
        assert!(txt.starts_with("Totals through week 12 (deaths):\n"));
        assert!(txt.contains("2019              100\n"));
        assert!(txt.contains("2020              110    +10.0%\n"));
    }

    #[test]
    fn summary_lists_totals_and_peak() {
        let report = ExcessReport {
            region: Region::new("SE"),
            ages: AgeGroup::Over65.bands(),
            measure: Measure::Deaths,
            lookback_years: 5,
            from_year: Some(2020),
            points: vec![
                ExcessPoint {
                    week: week(2020, 14),
                    actual: 130.0,
                    expected: Some(100.0),
                },
                ExcessPoint {
                    week: week(2020, 15),
                    actual: 95.0,
                    expected: Some(100.0),
                },
            ],
        };
        let txt = format_excess_summary(&report);
        assert!(txt.contains("Ages: Y65-69 .. Y_GE90 (6 bands)\n"));
        assert!(txt.contains("- excess: 25\n"));
        assert!(txt.contains("- peak week: 2020-W14 (+30)\n"));
    }

    #[test]
    fn sweep_sorted_by_excess() {
        let row = |region: &str, excess: f64| SweepRow {
            region: Region::new(region),
            ages: "all".to_string(),
            lookback_years: 5,
            total_excess: excess,
            total_above: excess.max(0.0),
            total_below: (-excess).max(0.0),
            gaps: 0,
        };
        let txt = format_sweep(&[row("AT", 10.0), row("SE", 50.0)]);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[2].starts_with("SE"));
        assert!(lines[3].starts_with("AT"));
    }
}
