//! Raw tables as delivered by a data source (or read back from the cache).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{AgeBand, Week};

/// Region code (country or NUTS geography). Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(code: &str) -> Self {
        Region::new(code)
    }
}

/// Deaths for one `(region, age band, week)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRecord {
    #[serde(rename = "period")]
    pub week: Week,
    #[serde(rename = "geo")]
    pub region: Region,
    pub age: AgeBand,
    pub deaths: f64,
}

/// Population on January 1st for one `(region, age band, year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub year: i32,
    #[serde(rename = "geo")]
    pub region: Region,
    pub age: AgeBand,
    pub population: f64,
}

/// Weekly mortality table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MortalityTable {
    records: Vec<MortalityRecord>,
}

impl MortalityTable {
    pub fn new(records: Vec<MortalityRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MortalityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn regions(&self) -> Vec<Region> {
        let set: BTreeSet<&Region> = self.records.iter().map(|r| &r.region).collect();
        set.into_iter().cloned().collect()
    }

    /// Calendar years with at least one record, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.week.year()).collect();
        set.into_iter().collect()
    }

    /// Keep only the given regions and age bands. An empty slice means "no restriction".
    pub fn restricted_to(&self, regions: &[Region], ages: &[AgeBand]) -> Self {
        let records = self
            .records
            .iter()
            .filter(|r| regions.is_empty() || regions.contains(&r.region))
            .filter(|r| ages.is_empty() || ages.contains(&r.age))
            .cloned()
            .collect();
        Self { records }
    }
}

/// Yearly population table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    records: Vec<PopulationRecord>,
}

impl PopulationTable {
    pub fn new(records: Vec<PopulationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PopulationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn restricted_to(&self, regions: &[Region], ages: &[AgeBand]) -> Self {
        let records = self
            .records
            .iter()
            .filter(|r| regions.is_empty() || regions.contains(&r.region))
            .filter(|r| ages.is_empty() || ages.contains(&r.age))
            .cloned()
            .collect();
        Self { records }
    }
}

/// An explicitly owned copy of the input data, built once per run.
#[derive(Debug, Clone, Default)]
pub struct DataSnapshot {
    pub mortality: MortalityTable,
    pub population: PopulationTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restriction_and_listings() {
        let band = AgeBand::parse("Y35-39").unwrap();
        let other = AgeBand::parse("Y_LT5").unwrap();
        let table = MortalityTable::new(vec![
            MortalityRecord {
                week: Week::from_iso(2019, 1).unwrap(),
                region: Region::new("SE"),
                age: band,
                deaths: 3.0,
            },
            MortalityRecord {
                week: Week::from_iso(2021, 1).unwrap(),
                region: Region::new("AT"),
                age: other,
                deaths: 1.0,
            },
        ]);

        assert_eq!(table.regions(), vec![Region::new("AT"), Region::new("SE")]);
        assert_eq!(table.years(), vec![2019, 2021]);
        assert_eq!(table.restricted_to(&[Region::new("SE")], &[]).len(), 1);
        assert_eq!(table.restricted_to(&[], &[band]).len(), 1);
        assert_eq!(table.restricted_to(&[Region::new("SE")], &[other]).len(), 0);
    }
}
