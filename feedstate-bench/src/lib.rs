//! # feedstate Bench
//!
//! Benchmarking utilities for feedstate performance testing.

pub mod latency;
pub mod workload;

pub use latency::{LatencyCollector, LatencyStats};
pub use workload::Workload;
