//! standort: Monte Carlo branch-location recommendation engine.
//!
//! Samples candidate sites inside a geographic region, scores each one by
//! proximity to target companies (or via a learned surrogate model), and
//! returns a diverse set of top-valued recommendations.

pub mod cache;
pub mod cli;
pub mod data;
pub mod engine;
pub mod predictor;
pub mod server;
