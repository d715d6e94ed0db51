//! Input/output helpers.
//!
//! - raw CSV ingest + validation (`ingest`)
//! - snapshot codec for cached tables (`snapshot`)
//! - on-disk snapshot cache with archiving (`cache`)
//! - result exports (CSV/JSON) (`export`)

pub mod cache;
pub mod export;
pub mod ingest;
pub mod snapshot;

pub use cache::*;
pub use export::*;
pub use ingest::*;
pub use snapshot::*;
