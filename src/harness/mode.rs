//! Benchmark mode selection and results.

/// The four benchmark entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BenchMode {
    AggregateFull,
    AggregateFingerprint,
    IndividualFull,
    IndividualFingerprint,
}

impl BenchMode {
    pub const ALL: [BenchMode; 4] = [
        BenchMode::AggregateFull,
        BenchMode::AggregateFingerprint,
        BenchMode::IndividualFull,
        BenchMode::IndividualFingerprint,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BenchMode::AggregateFull => "aggregate_full",
            BenchMode::AggregateFingerprint => "aggregate_fingerprint",
            BenchMode::IndividualFull => "individual_full",
            BenchMode::IndividualFingerprint => "individual_fingerprint",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            BenchMode::AggregateFull => "Total ticks for a chained run of full hashes",
            BenchMode::AggregateFingerprint => "Total ticks for a chained run of fingerprints",
            BenchMode::IndividualFull => "Ticks for each full hash call",
            BenchMode::IndividualFingerprint => "Ticks for each fingerprint call",
        }
    }

    /// Whether the mode reports one count per trial.
    pub const fn is_per_trial(self) -> bool {
        matches!(
            self,
            BenchMode::IndividualFull | BenchMode::IndividualFingerprint
        )
    }

    /// Look a mode up by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }
}

/// Raw tick counts produced by a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timings {
    /// Begin of the first trial to end of the last.
    Aggregate(u64),
    /// One count per trial, in input order.
    PerTrial(Vec<u64>),
}

impl Timings {
    pub fn aggregate(&self) -> Option<u64> {
        match self {
            Timings::Aggregate(total) => Some(*total),
            Timings::PerTrial(_) => None,
        }
    }

    pub fn per_trial(&self) -> Option<&[u64]> {
        match self {
            Timings::Aggregate(_) => None,
            Timings::PerTrial(timings) => Some(timings.as_slice()),
        }
    }
}
