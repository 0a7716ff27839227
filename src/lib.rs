//! `price-forecast` library crate.
//!
//! The binary (`price-forecast`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - each stage (clean, aggregate, forecast) can be reused on its own
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod clean;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
