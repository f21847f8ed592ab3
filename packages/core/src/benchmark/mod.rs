//! Benchmark Analytics Engine
//!
//! Filters plan-fee observations by peer group (geography, business type,
//! company size) and turns the matching fees into percentile bands, a
//! per-period series for charting, and comparative insights.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod filter;
pub mod insights;
pub mod percentile;
pub mod source;
pub mod types;


pub use engine::BenchmarkEngine;
pub use error::{BenchmarkError, SourceError};
pub use source::BenchmarkSource;
pub use types::*;
