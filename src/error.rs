//! Error type for precondition and configuration failures.
//!
//! Allocation failure is not represented here: without its buffer a run
//! has no meaningful result, so it aborts instead.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A slice does not hold exactly `num_trials` entries.
    TrialCountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A requested input length is larger than the declared maximum.
    LengthExceedsMax {
        index: usize,
        len: usize,
        max_len: usize,
    },
    /// A per-trial mode was asked to run zero trials.
    NoTrials,
    InvalidConfig(String),
    Verification(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TrialCountMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "{} has {} entries but num_trials is {}",
                what, actual, expected
            ),
            Error::LengthExceedsMax {
                index,
                len,
                max_len,
            } => write!(
                f,
                "input length {} at trial {} exceeds max_len {}",
                len, index, max_len
            ),
            Error::NoTrials => write!(f, "per-trial modes need at least one trial"),
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Verification(msg) => write!(f, "verification failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
