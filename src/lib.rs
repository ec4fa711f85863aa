//! benchcost - CPU frequency energy-cost analysis for sultan_bench logs
//!
//! This library turns kernel log captures from CPU frequency benchmarks into
//! per-frequency energy costs, performance/efficiency tables and EAS energy
//! model device-tree fragments.

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod energy_model;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod session;
