//! Raw data sources.
//!
//! A source hands out the mortality and population tables for a selection of
//! regions and age bands. Combinations it has no data for are simply absent.

use crate::domain::{AgeBand, MortalityTable, PopulationTable, Region};
use crate::error::MortalityError;

pub mod csv_source;
pub mod sample;

pub use csv_source::CsvDirectorySource;
pub use sample::{SyntheticConfig, SyntheticSource};

pub trait RawDataSource {
    /// Short description used in log lines.
    fn describe(&self) -> String;

    /// Weekly deaths. Empty slices mean "no restriction".
    fn mortality(&self, regions: &[Region], ages: &[AgeBand]) -> Result<MortalityTable, MortalityError>;

    /// Yearly population. Empty slices mean "no restriction".
    fn population(&self, regions: &[Region], ages: &[AgeBand]) -> Result<PopulationTable, MortalityError>;
}
