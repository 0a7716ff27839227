//! Additive trend + seasonality model.
//!
//! Models are implemented as small, pure functions so that fitting and
//! simulation code can stay generic.

pub mod model;

pub use model::*;
