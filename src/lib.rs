//! `excess-mortality` library crate.
//!
//! The binary (`mortality`) is a thin wrapper around this library so that:
//!
//! - aggregation and forecasting are testable without spawning processes
//! - the pure core (`aggregate`, `forecast`) can be reused by other front ends
//! - data access (`data`, `io`) stays swappable behind traits

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
