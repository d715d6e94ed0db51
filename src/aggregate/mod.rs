//! Series aggregation.
//!
//! Collapses the per-age-band rows of a raw table into one series for a
//! region and a selection of age bands:
//!
//! raw table -> filter region -> filter age bands -> sum per period
//!
//! Requested bands that have no rows simply contribute nothing. Labels that
//! are not part of the age band vocabulary are rejected before any data is
//! looked at.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    AgeBand, GappedSeries, MortalityTable, PopulationTable, Region, WeeklySeries, YearlySeries,
    resolve_age_labels,
};
use crate::error::MortalityError;

pub mod population;

pub use population::fill_population_gaps;

const ONE_MILLION: f64 = 1_000_000.0;

/// Total weekly deaths for `region` over the selected age bands.
pub fn aggregate_deaths<S: AsRef<str>>(
    table: &MortalityTable,
    region: &Region,
    age_labels: &[S],
) -> Result<WeeklySeries, MortalityError> {
    let bands = resolve_age_labels(age_labels)?;
    Ok(sum_deaths(table, region, &bands))
}

/// Total yearly population for `region` over the selected age bands.
pub fn aggregate_population<S: AsRef<str>>(
    table: &PopulationTable,
    region: &Region,
    age_labels: &[S],
) -> Result<YearlySeries, MortalityError> {
    let bands = resolve_age_labels(age_labels)?;
    Ok(sum_population(table, region, &bands))
}

/// Weekly deaths per million inhabitants of the selected age bands.
///
/// The denominator is the population of the week's calendar year. Weeks whose
/// year has no (positive) population total are kept as explicit gaps.
pub fn aggregate_rate<S: AsRef<str>>(
    mortality: &MortalityTable,
    population: &PopulationTable,
    region: &Region,
    age_labels: &[S],
) -> Result<GappedSeries, MortalityError> {
    let bands = resolve_age_labels(age_labels)?;
    let deaths = sum_deaths(mortality, region, &bands);
    let population = sum_population(population, region, &bands);

    let rate = deaths
        .iter()
        .map(|(week, d)| {
            let millions = population
                .get(week.year())
                .map(|p| p / ONE_MILLION)
                .filter(|p| p.is_finite() && *p > 0.0);
            if millions.is_none() {
                log::debug!("no population for {region} in {}; leaving {week} empty", week.year());
            }
            (week, millions.map(|p| d / p))
        })
        .collect();

    Ok(rate)
}

fn sum_deaths(table: &MortalityTable, region: &Region, bands: &BTreeSet<AgeBand>) -> WeeklySeries {
    let mut totals = BTreeMap::new();
    for record in table.records() {
        if &record.region != region || !bands.contains(&record.age) {
            continue;
        }
        *totals.entry(record.week).or_insert(0.0) += record.deaths;
    }
    WeeklySeries::from(totals)
}

fn sum_population(table: &PopulationTable, region: &Region, bands: &BTreeSet<AgeBand>) -> YearlySeries {
    let mut totals = BTreeMap::new();
    for record in table.records() {
        if &record.region != region || !bands.contains(&record.age) {
            continue;
        }
        *totals.entry(record.year).or_insert(0.0) += record.population;
    }
    YearlySeries::from(totals)
}
