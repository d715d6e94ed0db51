use excess_mortality::aggregate::aggregate_deaths;
use excess_mortality::app::pipeline::{load_snapshot, run_excess};
use excess_mortality::data::{CsvDirectorySource, RawDataSource, SyntheticConfig, SyntheticSource};
use excess_mortality::domain::{
    AgeBand, ExcessConfig, ForecastConfig, Measure, MortalityRecord, MortalityTable, Region, Week, WeeklySeries,
};
use excess_mortality::forecast::{Forecaster, expected_deaths};
use excess_mortality::io::{FileSnapshotCache, write_excess_json};

fn config(region: &str, ages: &[&str]) -> ExcessConfig {
    ExcessConfig {
        region: Region::new(region),
        ages: ages.iter().map(|a| a.to_string()).collect(),
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
fn csv_directory_through_cache_to_json_export() {
    let tmp = tempfile::tempdir().unwrap();
    let generated = SyntheticSource::generate(&SyntheticConfig {
        regions: vec![Region::new("SE")],
        first_year: 2014,
        last_year: 2021,
        ..SyntheticConfig::default()
    })
    .unwrap();

    let source = CsvDirectorySource::create(
        tmp.path().join("raw"),
        generated.mortality_table(),
        generated.population_table(),
    )
    .unwrap();
    let cache = FileSnapshotCache::with_timeout_hours(tmp.path().join("cache"), tmp.path().join("archive"), 24.0)
        .unwrap();

    let snapshot = load_snapshot(&source, Some(&cache)).unwrap();
    assert_eq!(&snapshot.mortality, generated.mortality_table());

    let report = run_excess(&snapshot, &config("SE", &["65plus"])).unwrap();
    let peak = report.peak().unwrap();
    assert_eq!(peak.week.year(), 2020);

    let json_path = tmp.path().join("out/excess.json");
    write_excess_json(&json_path, &report).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&json_path).unwrap()).unwrap();
    let labels = value["weekly_data"]["label"].as_array().unwrap();
    assert_eq!(labels.len(), report.points.len());
    assert_eq!(labels[0], "2020/1");
}

#[test]
fn full_age_set_matches_weekly_totals() {
    let generated = SyntheticSource::generate(&SyntheticConfig {
        regions: vec![Region::new("AT")],
        first_year: 2019,
        last_year: 2020,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let table = generated.mortality(&[], &[]).unwrap();
    let region = Region::new("AT");

    let all = aggregate_deaths(&table, &region, &["all"]).unwrap();
    let codes: Vec<String> = AgeBand::ALL.iter().map(|b| b.query_code()).collect();
    let explicit = aggregate_deaths(&table, &region, &codes).unwrap();
    assert_eq!(all, explicit);

    let week = Week::from_iso(2020, 10).unwrap();
    let by_hand: f64 = table
        .records()
        .iter()
        .filter(|r| r.week == week)
        .map(|r| r.deaths)
        .sum();
    assert_eq!(all.get(week), Some(by_hand));
}

#[test]
fn constant_deaths_forecast_themselves() {
    let start = Week::from_iso(2010, 1).unwrap();
    let series: WeeklySeries = (0..520).map(|i| (start.offset(i), 10.0)).collect();

    let expected = expected_deaths(&series, 5).unwrap();
    assert_eq!(expected.len(), 520);
    assert!(expected.iter().all(|(_, v)| v == 10.0));

    let point = Forecaster::new(ForecastConfig::default())
        .unwrap()
        .forecast_point(&series, start.offset(260))
        .unwrap();
    assert_eq!(point.baseline, 10.0);
    assert_eq!(point.growth_ratio, 1.0);
    assert_eq!(point.value, point.baseline);
}

#[test]
fn absent_band_contributes_nothing() {
    let week = Week::from_iso(2020, 1).unwrap();
    let table = MortalityTable::new(vec![MortalityRecord {
        week,
        region: Region::new("SE"),
        age: AgeBand::parse("Y_GE90").unwrap(),
        deaths: 8.0,
    }]);
    let series = aggregate_deaths(&table, &Region::new("SE"), &["Y_GE90", "Y_LT5"]).unwrap();
    assert_eq!(series.get(week), Some(8.0));
}
