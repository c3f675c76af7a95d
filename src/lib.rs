//! Keystroke sequence autocorrection on top of `sequence-transform-core`.

pub mod config;
pub mod dictionary;
pub mod domain;
pub mod output;
pub mod session;
pub mod utils;

pub use domain::outcome::{Emission, KeyOutcome, SkipReason};
pub use output::{OutputSink, SimulatedOutput};
pub use session::Session;

#[cfg(test)]
mod tests;
