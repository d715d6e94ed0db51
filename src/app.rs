//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves settings from the environment
//! - loads the data snapshot (through the cache)
//! - runs aggregation + forecasting
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DataArgs, DemoArgs, ExcessArgs, SweepArgs, YearlyArgs, YearsArgs};
use crate::config::Settings;
use crate::data::{CsvDirectorySource, SyntheticConfig, SyntheticSource};
use crate::domain::{AgeBand, AgeGroup, ExcessConfig, ForecastConfig, Measure, Region};
use crate::error::AppError;
use crate::report::YearlyChart;

pub mod pipeline;

/// Entry point for the `mortality` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    let settings = Settings::from_env()?;
    log::debug!("settings: {settings:?}");

    match cli.command {
        Command::Excess(args) => handle_excess(args, &settings),
        Command::Yearly(args) => handle_yearly(args, &settings),
        Command::Regions(args) => handle_regions(args, &settings),
        Command::Ages => handle_ages(),
        Command::Years(args) => handle_years(args, &settings),
        Command::Sweep(args) => handle_sweep(args, &settings),
        Command::Demo(args) => handle_demo(args, &settings),
    }
}

fn handle_excess(args: ExcessArgs, settings: &Settings) -> Result<(), AppError> {
    let config = excess_config_from_args(&args);
    let snapshot = pipeline::load_from_args(&args.data, settings)?;
    let report = pipeline::run_excess(&snapshot, &config)?;

    println!("{}", crate::report::format_excess_summary(&report));

    if args.weeks {
        println!("{}", crate::report::format_weekly_table(&report.points, report.measure));
    }

    if config.plot {
        let plot = crate::plot::render_excess_plot(
            &report.points,
            report.measure.unit_label(),
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::export::write_excess_json(path, &report)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(path) = &config.export_csv {
        crate::io::export::write_excess_csv(path, &report)?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn handle_yearly(args: YearlyArgs, settings: &Settings) -> Result<(), AppError> {
    let snapshot = pipeline::load_from_args(&args.data, settings)?;
    let region = Region::new(&args.selection.region);
    let (totals, max_week) = pipeline::run_yearly(&snapshot, &region, &args.selection.ages, args.max_week)?;

    println!("Region: {region}");
    println!("{}", crate::report::format_yearly_table(&totals, max_week, Measure::Deaths));
    println!("{}", crate::plot::render_yearly_bars(&totals, args.width, 0));

    if let Some(path) = &args.export_json {
        let file = std::fs::File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create export '{}': {e}", path.display())))?;
        crate::io::export::write_json(file, &YearlyChart::new(&totals, max_week))?;
    }

    Ok(())
}

fn handle_regions(args: DataArgs, settings: &Settings) -> Result<(), AppError> {
    let snapshot = pipeline::load_from_args(&args, settings)?;
    for region in snapshot.mortality.regions() {
        println!("{region}");
    }
    Ok(())
}

fn handle_ages() -> Result<(), AppError> {
    println!("{:<8} label", "code");
    for band in AgeBand::ALL {
        println!("{:<8} {}", band.query_code(), band.data_label());
    }
    println!();
    println!("groups:");
    for group in AgeGroup::ALL {
        let bands = group.bands();
        let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
            continue;
        };
        println!("{:<8} {} .. {}", group.name(), first, last);
    }
    Ok(())
}

fn handle_years(args: YearsArgs, settings: &Settings) -> Result<(), AppError> {
    let snapshot = pipeline::load_from_args(&args.data, settings)?;
    let mortality = match &args.region {
        Some(region) => snapshot.mortality.restricted_to(&[Region::new(region)], &[]),
        None => snapshot.mortality,
    };
    let years = newest_first(mortality.years());
    if years.is_empty() {
        return Err(AppError::new(3, "No data for the requested region."));
    }
    for year in years {
        println!("{year}");
    }
    Ok(())
}

fn handle_sweep(args: SweepArgs, settings: &Settings) -> Result<(), AppError> {
    let snapshot = pipeline::load_from_args(&args.data, settings)?;
    let regions: Vec<Region> = if args.regions.is_empty() {
        snapshot.mortality.regions()
    } else {
        args.regions.iter().map(Region::new).collect()
    };

    let tasks = pipeline::sweep_tasks(&regions, &args.groups, &args.lookbacks);
    let rows = pipeline::run_sweep(&snapshot, &tasks, args.year, args.slack);
    if rows.is_empty() {
        return Err(AppError::new(3, "Every sweep combination failed; rerun with -v for details."));
    }
    if rows.len() < tasks.len() {
        eprintln!("{} of {} combinations skipped (see log).", tasks.len() - rows.len(), tasks.len());
    }

    println!("{}", crate::report::format_sweep(&rows));
    Ok(())
}

fn handle_demo(args: DemoArgs, settings: &Settings) -> Result<(), AppError> {
    let config = SyntheticConfig {
        regions: args.regions.iter().map(Region::new).collect(),
        first_year: args.first_year,
        last_year: args.last_year,
        seed: args.seed,
        wave_year: (!args.no_wave).then_some(args.wave_year),
        ..SyntheticConfig::default()
    };
    let source = SyntheticSource::generate(&config)?;
    let out = args.out.clone().unwrap_or_else(|| settings.data_dir.clone());
    let written = CsvDirectorySource::create(&out, source.mortality_table(), source.population_table())?;

    println!(
        "Wrote {} mortality and {} population rows to {}",
        source.mortality_table().len(),
        source.population_table().len(),
        written.dir().display()
    );
    Ok(())
}

fn newest_first(mut years: Vec<i32>) -> Vec<i32> {
    years.sort_unstable_by(|a, b| b.cmp(a));
    years
}

pub fn excess_config_from_args(args: &ExcessArgs) -> ExcessConfig {
    ExcessConfig {
        region: Region::new(&args.selection.region),
        ages: args.selection.ages.clone(),
        from_year: args.year,
        measure: if args.rate { Measure::PerMillion } else { Measure::Deaths },
        forecast: ForecastConfig {
            lookback_years: args.lookback,
            outlier_slack: args.slack,
        },
        allow_gaps: args.allow_gaps,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    }
}
