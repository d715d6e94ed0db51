//! Population gap filling.
//!
//! Population is published once a year (January 1st) and lags the weekly
//! mortality data by a year or two. Before aggregation we make sure every
//! `(region, age band)` group has a value for each year up to a target year:
//!
//! - years between two published values are linearly interpolated
//! - years after the last published value are forward-filled with it
//! - years before the first published value stay absent

use std::collections::BTreeMap;

use crate::domain::{AgeBand, PopulationRecord, PopulationTable, Region};

pub fn fill_population_gaps(table: &PopulationTable, through_year: i32) -> PopulationTable {
    let mut groups: BTreeMap<(Region, AgeBand), BTreeMap<i32, f64>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry((record.region.clone(), record.age))
            .or_default()
            .insert(record.year, record.population);
    }

    let mut records = Vec::with_capacity(table.len());
    for ((region, age), known) in groups {
        for (year, population) in fill_years(&known, through_year) {
            records.push(PopulationRecord {
                year,
                region: region.clone(),
                age,
                population,
            });
        }
    }

    PopulationTable::new(records)
}

fn fill_years(known: &BTreeMap<i32, f64>, through_year: i32) -> Vec<(i32, f64)> {
    let (Some((&first, _)), Some((&last, &last_value))) = (known.iter().next(), known.iter().next_back()) else {
        return Vec::new();
    };

    let end = last.max(through_year);
    let mut out = Vec::with_capacity((end - first + 1) as usize);
    for year in first..=end {
        let value = if let Some(v) = known.get(&year) {
            *v
        } else if year > last {
            last_value
        } else {
            interpolate(known, year)
        };
        out.push((year, value));
    }
    out
}

/// Linear interpolation between the nearest known years around `year`.
fn interpolate(known: &BTreeMap<i32, f64>, year: i32) -> f64 {
    let before = known.range(..year).next_back();
    let after = known.range(year..).next();
    match (before, after) {
        (Some((&y0, &v0)), Some((&y1, &v1))) => {
            let u = (year - y0) as f64 / (y1 - y0) as f64;
            v0 + u * (v1 - v0)
        }
        (Some((_, &v)), None) | (None, Some((_, &v))) => v,
        (None, None) => 0.0,
    }
}
