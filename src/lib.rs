//! # Hash-Latency-Bench
//!
//! Cycle-accurate latency measurement for a hash primitive, in two call
//! shapes (64-bit full hash, 128-bit fingerprint) and two reporting styles
//! (one total per run, one count per trial).
//!
//! Consecutive calls are chained through a seed accumulator so the CPU
//! cannot overlap them, and each timed region is bounded by serializing
//! counter reads. Statistics and reporting are left to the caller.

pub mod error;
pub mod harness;
pub mod primitive;
pub mod utils;
pub mod workload;

pub use error::{Error, Result};
pub use harness::{BenchConfig, BenchMode, Harness, ParamPool, PinStrategy, Timings};
pub use primitive::{Fingerprint, HashPrimitive, MixHash, MixParams, Which};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::harness::{BenchConfig, BenchMode, Harness, ParamPool, Timings};
    pub use crate::primitive::{HashPrimitive, MixHash};
    pub use crate::workload::Workload;
}
