//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - periods (`Week`) and the age band vocabulary (`AgeBand`, `AgeGroup`)
//! - series (`WeeklySeries`, `YearlySeries`, `GappedSeries`)
//! - raw tables (`MortalityTable`, `PopulationTable`, `DataSnapshot`)
//! - run configuration (`ForecastConfig`, `ExcessConfig`)

pub mod age;
pub mod period;
pub mod series;
pub mod table;
pub mod types;

pub use age::*;
pub use period::*;
pub use series::*;
pub use table::*;
pub use types::*;
