//! CPPILab Core: market panel, regime classifier, CPPI and buy-and-hold simulators.
//!
//! This crate contains the pure computational pieces of the pipeline:
//! - Domain types (price/return series, aligned market panel, regime labels)
//! - Market data providers (wide CSV import, synthetic) and business-day alignment
//! - Trailing-window regime classification
//! - Path-dependent CPPI simulator and the buy-and-hold benchmark
//! - Deterministic RNG hierarchy for reproducible resampling

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod regime;
pub mod rng;

pub use error::AnalysisError;
