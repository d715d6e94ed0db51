//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! source -> snapshot cache -> population gap fill -> aggregation -> forecast -> excess
//!
//! The command handlers can then focus on presentation (printing vs exports).

use rayon::prelude::*;

use crate::aggregate::{aggregate_deaths, aggregate_rate, fill_population_gaps};
use crate::cli::DataArgs;
use crate::config::Settings;
use crate::data::{CsvDirectorySource, RawDataSource, SyntheticConfig, SyntheticSource};
use crate::domain::{
    DataSnapshot, ExcessConfig, ForecastConfig, GappedSeries, Measure, MortalityTable, PopulationTable,
    Region, WeeklySeries, YearlySeries, resolve_age_labels,
};
use crate::error::MortalityError;
use crate::forecast::Forecaster;
use crate::io::cache::{FileSnapshotCache, SnapshotCache};
use crate::io::snapshot::Snapshot;
use crate::report::{ExcessReport, SweepRow, compute_excess, yearly_deaths};

pub const MORTALITY_SNAPSHOT: &str = "mortality";
pub const POPULATION_SNAPSHOT: &str = "population";

/// Pick the raw data source for a run.
pub fn open_source(args: &DataArgs, settings: &Settings) -> Result<Box<dyn RawDataSource>, MortalityError> {
    if args.synthetic {
        let config = SyntheticConfig {
            seed: args.seed,
            ..SyntheticConfig::default()
        };
        return Ok(Box::new(SyntheticSource::generate(&config)?));
    }
    let dir = args.data_dir.clone().unwrap_or_else(|| settings.data_dir.clone());
    Ok(Box::new(CsvDirectorySource::new(dir)))
}

/// The snapshot cache for a run, or `None` when caching is off.
///
/// Generated data is never cached.
pub fn open_cache(args: &DataArgs, settings: &Settings) -> Result<Option<FileSnapshotCache>, MortalityError> {
    if args.no_cache || args.synthetic {
        return Ok(None);
    }
    let cache = FileSnapshotCache::with_timeout_hours(
        args.cache_dir.clone().unwrap_or_else(|| settings.cache_dir.clone()),
        args.archive_dir.clone().unwrap_or_else(|| settings.archive_dir.clone()),
        args.cache_timeout_hours.unwrap_or(settings.cache_timeout_hours),
    )?;
    Ok(Some(cache))
}

/// Load both tables, going through the cache when there is one.
///
/// Population is gap-filled through the last year that has mortality data.
pub fn load_snapshot<C: SnapshotCache>(
    source: &dyn RawDataSource,
    cache: Option<&C>,
) -> Result<DataSnapshot, MortalityError> {
    let mortality: MortalityTable = cached(cache, MORTALITY_SNAPSHOT, || source.mortality(&[], &[]))?;
    if mortality.is_empty() {
        return Err(MortalityError::insufficient_history(
            source.describe(),
            "the source has no mortality records",
        ));
    }
    let population: PopulationTable = cached(cache, POPULATION_SNAPSHOT, || source.population(&[], &[]))?;

    let through_year = mortality.years().last().copied().unwrap_or_default();
    let population = fill_population_gaps(&population, through_year);

    log::debug!(
        "snapshot from {}: {} mortality rows, {} population rows (filled through {through_year})",
        source.describe(),
        mortality.len(),
        population.len()
    );

    Ok(DataSnapshot { mortality, population })
}

/// Source, cache and snapshot in one step, as configured by CLI flags and settings.
pub fn load_from_args(args: &DataArgs, settings: &Settings) -> Result<DataSnapshot, MortalityError> {
    let source = open_source(args, settings)?;
    let cache = open_cache(args, settings)?;
    load_snapshot(source.as_ref(), cache.as_ref())
}

fn cached<C, T, F>(cache: Option<&C>, name: &str, fetch: F) -> Result<T, MortalityError>
where
    C: SnapshotCache,
    T: Snapshot,
    F: FnOnce() -> Result<T, MortalityError>,
{
    let Some(cache) = cache else {
        return fetch();
    };
    if let Some(hit) = cache.get(name)? {
        return Ok(hit);
    }
    let fresh = fetch()?;
    cache.put(name, &fresh)?;
    Ok(fresh)
}

/// The series the excess is computed on.
///
/// Per-million weeks without a population denominator are dropped when gaps
/// are allowed and are an error otherwise.
pub fn actual_series(snapshot: &DataSnapshot, config: &ExcessConfig) -> Result<WeeklySeries, MortalityError> {
    let series = match config.measure {
        Measure::Deaths => aggregate_deaths(&snapshot.mortality, &config.region, &config.ages)?,
        Measure::PerMillion => {
            let rate = aggregate_rate(&snapshot.mortality, &snapshot.population, &config.region, &config.ages)?;
            if config.allow_gaps {
                if rate.gap_count() > 0 {
                    log::warn!("{} week(s) without population for {}", rate.gap_count(), config.region);
                }
                rate.present()
            } else {
                rate.complete()?
            }
        }
    };

    if series.is_empty() {
        return Err(MortalityError::insufficient_history(
            &config.region,
            "no deaths recorded for the selected age bands",
        ));
    }
    Ok(series)
}

/// Aggregate, forecast and compare for one region and age selection.
pub fn run_excess(snapshot: &DataSnapshot, config: &ExcessConfig) -> Result<ExcessReport, MortalityError> {
    let ages = resolve_age_labels(&config.ages)?;
    let actual = actual_series(snapshot, config)?;

    let forecaster = Forecaster::new(config.forecast)?;
    let expected: GappedSeries = if config.allow_gaps {
        forecaster.expected_with_gaps(&actual)
    } else {
        forecaster
            .expected_deaths(&actual)?
            .iter()
            .map(|(week, v)| (week, Some(v)))
            .collect()
    };

    let points = compute_excess(&actual, &expected)
        .into_iter()
        .filter(|p| config.from_year.is_none_or(|year| p.week.year() >= year))
        .collect::<Vec<_>>();

    log::debug!(
        "{}: {} weeks aggregated, {} reported, {} bootstrap",
        config.region,
        actual.len(),
        points.len(),
        forecaster.bootstrap_len().min(actual.len())
    );

    Ok(ExcessReport {
        region: config.region.clone(),
        ages: ages.into_iter().collect(),
        measure: config.measure,
        lookback_years: config.forecast.lookback_years,
        from_year: config.from_year,
        points,
    })
}

/// Yearly actual deaths through `max_week` (default: the latest week in the series).
pub fn run_yearly<S: AsRef<str>>(
    snapshot: &DataSnapshot,
    region: &Region,
    ages: &[S],
    max_week: Option<u32>,
) -> Result<(YearlySeries, u32), MortalityError> {
    let series = aggregate_deaths(&snapshot.mortality, region, ages)?;
    let Some(last) = series.last_week() else {
        return Err(MortalityError::insufficient_history(
            region,
            "no deaths recorded for the selected age bands",
        ));
    };
    let max_week = max_week.unwrap_or_else(|| last.week());
    if !(1..=53).contains(&max_week) {
        return Err(MortalityError::invalid_input(format!("Week {max_week} is outside 1..=53.")));
    }
    Ok((yearly_deaths(&series, max_week), max_week))
}

/// One sweep task.
#[derive(Debug, Clone)]
pub struct SweepTask {
    pub region: Region,
    pub ages: String,
    pub lookback_years: usize,
}

/// Every `(region, age selection, lookback)` combination, in a stable order.
pub fn sweep_tasks(regions: &[Region], groups: &[String], lookbacks: &[usize]) -> Vec<SweepTask> {
    let mut tasks = Vec::with_capacity(regions.len() * groups.len() * lookbacks.len());
    for region in regions {
        for ages in groups {
            for &lookback_years in lookbacks {
                tasks.push(SweepTask {
                    region: region.clone(),
                    ages: ages.clone(),
                    lookback_years,
                });
            }
        }
    }
    tasks
}

/// Run every task in parallel; failed tasks are logged and left out.
pub fn run_sweep(
    snapshot: &DataSnapshot,
    tasks: &[SweepTask],
    from_year: Option<i32>,
    outlier_slack: f64,
) -> Vec<SweepRow> {
    tasks
        .par_iter()
        .filter_map(|task| {
            let config = ExcessConfig {
                region: task.region.clone(),
                ages: vec![task.ages.clone()],
                from_year,
                measure: Measure::Deaths,
                forecast: ForecastConfig {
                    lookback_years: task.lookback_years,
                    outlier_slack,
                },
                allow_gaps: true,
                plot: false,
                plot_width: 0,
                plot_height: 0,
                export_json: None,
                export_csv: None,
            };
            match run_excess(snapshot, &config) {
                Ok(report) => Some(SweepRow::from_report(&report, task.ages.clone())),
                Err(err) => {
                    log::warn!(
                        "sweep {} / {} / {}y skipped: {err}",
                        task.region,
                        task.ages,
                        task.lookback_years
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_population;
    use crate::domain::{DEFAULT_OUTLIER_SLACK, Week};

    fn snapshot() -> DataSnapshot {
        let source = SyntheticSource::generate(&SyntheticConfig {
            regions: vec![Region::new("AA"), Region::new("BB")],
            first_year: 2014,
            last_year: 2021,
            ..SyntheticConfig::default()
        })
        .unwrap();
        load_snapshot::<FileSnapshotCache>(&source, None).unwrap()
    }

    fn excess_config(region: &str) -> ExcessConfig {
        ExcessConfig {
            region: Region::new(region),
            ages: vec!["65plus".to_string()],
            from_year: Some(2020),
            measure: Measure::Deaths,
            forecast: ForecastConfig::default(),
            allow_gaps: false,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_json: None,
            export_csv: None,
        }
    }

    #[test]
    fn excess_report_shows_the_wave() {
        let snapshot = snapshot();
        let report = run_excess(&snapshot, &excess_config("AA")).unwrap();

        assert!(report.points.iter().all(|p| p.week.year() >= 2020));
        assert_eq!(report.gap_count(), 0);
        assert_eq!(report.ages.len(), 6);

        let peak = report.peak().unwrap();
        assert_eq!(peak.week.year(), 2020);
        assert!((12..=20).contains(&peak.week.week()));
        assert!(report.total_above() > 0.0);
    }

    #[test]
    fn rate_path_uses_population() {
        let snapshot = snapshot();
        let mut config = excess_config("BB");
        config.measure = Measure::PerMillion;
        let report = run_excess(&snapshot, &config).unwrap();
        assert!(!report.points.is_empty());
        assert_eq!(report.measure.unit_label(), "deaths/million");

        let deaths = run_excess(&snapshot, &excess_config("BB")).unwrap();
        let population = aggregate_population(&snapshot.population, &Region::new("BB"), &["65plus"]).unwrap();
        let millions = population.get(2020).unwrap() / 1_000_000.0;
        assert!((report.points[0].actual - deaths.points[0].actual / millions).abs() < 1e-9);
    }

    #[test]
    fn unknown_region_is_no_data() {
        let err = run_excess(&snapshot(), &excess_config("ZZ")).unwrap_err();
        assert!(matches!(err, MortalityError::InsufficientHistory { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unknown_age_band_fails_first() {
        let mut config = excess_config("AA");
        config.ages = vec!["Y200-204".to_string()];
        let err = run_excess(&snapshot(), &config).unwrap_err();
        assert!(matches!(err, MortalityError::UnknownAgeBand { .. }));
    }

    #[test]
    fn yearly_defaults_to_latest_week() {
        let (totals, max_week) = run_yearly(&snapshot(), &Region::new("AA"), &["all"], None).unwrap();
        // 2021 has 52 ISO weeks.
        assert_eq!(max_week, 52);
        assert_eq!(totals.len(), 8);

        let (capped, _) = run_yearly(&snapshot(), &Region::new("AA"), &["all"], Some(10)).unwrap();
        assert!(capped.get(2019).unwrap() < totals.get(2019).unwrap());
        assert!(run_yearly(&snapshot(), &Region::new("AA"), &["all"], Some(60)).is_err());
    }

    #[test]
    fn sweep_covers_all_tasks_and_matches_single_runs() {
        let snapshot = snapshot();
        let regions = [Region::new("AA"), Region::new("BB")];
        let groups = ["all".to_string(), "65plus".to_string()];
        let tasks = sweep_tasks(&regions, &groups, &[3, 5]);
        assert_eq!(tasks.len(), 8);

        let rows = run_sweep(&snapshot, &tasks, Some(2020), DEFAULT_OUTLIER_SLACK);
        assert_eq!(rows.len(), 8);

        let mut single = excess_config("AA");
        single.allow_gaps = true;
        let expected = run_excess(&snapshot, &single).unwrap().total_excess();
        let row = rows
            .iter()
            .find(|r| r.region.as_str() == "AA" && r.ages == "65plus" && r.lookback_years == 5)
            .unwrap();
        assert_eq!(row.total_excess.to_bits(), expected.to_bits());
    }

    #[test]
    fn cache_is_filled_then_served() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = FileSnapshotCache::with_timeout_hours(tmp.path().join("cache"), tmp.path().join("archive"), 1.0)
            .unwrap();
        let source = SyntheticSource::generate(&SyntheticConfig {
            first_year: 2018,
            last_year: 2019,
            ..SyntheticConfig::default()
        })
        .unwrap();

        let first = load_snapshot(&source, Some(&cache)).unwrap();
        assert!(tmp.path().join("cache/mortality.csv").is_file());
        assert!(tmp.path().join("cache/population.csv").is_file());

        let second = load_snapshot(&source, Some(&cache)).unwrap();
        assert_eq!(first.mortality, second.mortality);
        assert_eq!(
            second.mortality.records()[0].week,
            Week::from_iso(2018, 1).unwrap()
        );
    }
}
