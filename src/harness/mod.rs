//! Benchmark modes: {full hash, fingerprint} x {aggregate, per trial}.
//!
//! Every mode allocates a fresh aligned buffer, then runs one hash call per
//! entry of `lengths`, each call's parameter set, input address and seed
//! taken from the [`Chain`]. The four loops are written out separately on
//! purpose: where `tick_begin`/`tick_end` sit relative to the call and the
//! chain updates is the measurement, and must not depend on how a generic
//! helper gets inlined.

pub mod chain;
pub mod config;
pub mod mode;
pub mod pool;
#[cfg(test)]
pub mod test;

pub use chain::Chain;
pub use config::{BenchConfig, PinStrategy, DEFAULT_PARAM_SEEDS};
pub use mode::{BenchMode, Timings};
pub use pool::ParamPool;

use crate::error::{Error, Result};
use crate::primitive::{HashPrimitive, Which};
use crate::utils::buffer::AlignedBuffer;
use crate::utils::cpu_affinity::CpuPinGuard;
use crate::utils::cycles::{tick_begin, tick_end};

/// A primitive, its parameter pool and a run configuration.
pub struct Harness<'p, H: HashPrimitive> {
    primitive: H,
    pool: &'p ParamPool<H::Params>,
    config: BenchConfig,
}

impl<'p, H: HashPrimitive> Harness<'p, H> {
    pub fn new(primitive: H, pool: &'p ParamPool<H::Params>, config: BenchConfig) -> Result<Self> {
        config.validate()?;
        if pool.seeds() != config.param_seeds {
            return Err(Error::InvalidConfig(format!(
                "parameter pool derived from seeds {:?}, config expects {:?}",
                pool.seeds(),
                config.param_seeds
            )));
        }
        Ok(Self {
            primitive,
            pool,
            config,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn primitive(&self) -> &H {
        &self.primitive
    }

    /// Validate a request before anything is allocated.
    fn check_request(&self, lengths: &[usize], num_trials: usize, max_len: usize) -> Result<()> {
        if lengths.len() != num_trials {
            return Err(Error::TrialCountMismatch {
                what: "lengths",
                expected: num_trials,
                actual: lengths.len(),
            });
        }
        if let Some(index) = lengths.iter().position(|&len| len > max_len) {
            return Err(Error::LengthExceedsMax {
                index,
                len: lengths[index],
                max_len,
            });
        }
        if max_len > self.config.max_supported_len() {
            return Err(Error::InvalidConfig(format!(
                "max_len {} cannot be allocated",
                max_len
            )));
        }
        Ok(())
    }

    fn check_timings(&self, timings: &[u64], num_trials: usize) -> Result<()> {
        if num_trials == 0 {
            return Err(Error::NoTrials);
        }
        if timings.len() != num_trials {
            return Err(Error::TrialCountMismatch {
                what: "timings",
                expected: num_trials,
                actual: timings.len(),
            });
        }
        Ok(())
    }

    /// Pin (if configured) and allocate the working buffer.
    fn setup(
        &self,
        mode: BenchMode,
        num_trials: usize,
        max_len: usize,
    ) -> (Option<CpuPinGuard>, AlignedBuffer) {
        let pin = (self.config.pin_strategy == PinStrategy::PerRun).then(CpuPinGuard::new);
        let buf = AlignedBuffer::for_lengths(max_len, &self.config);
        log::debug!(
            "{}: {} trials, max_len {}, {} byte buffer, core {:?}",
            mode.name(),
            num_trials,
            max_len,
            buf.len(),
            pin.as_ref().and_then(CpuPinGuard::core_id)
        );
        (pin, buf)
    }

    /// Total ticks for the whole run of full-hash calls.
    ///
    /// With `num_trials == 0` the result is the overhead of an empty
    /// begin/end pair.
    pub fn aggregate_full(
        &self,
        lengths: &[usize],
        num_trials: usize,
        max_len: usize,
    ) -> Result<u64> {
        self.check_request(lengths, num_trials, max_len)?;
        let (_pin, buf) = self.setup(BenchMode::AggregateFull, num_trials, max_len);
        let mask = self.config.jitter_mask;
        let mut chain = Chain::new();

        let begin = tick_begin(chain.value_mut());
        chain.absorb(begin);
        for &len in lengths {
            // SAFETY: offset <= jitter_mask <= jitter_margin and len <= max_len,
            // and the buffer is larger than max_len + jitter_margin.
            let input = unsafe { buf.window_unchecked(chain.offset(mask), len) };
            let hash = self.primitive.full(
                self.pool.select(chain.seed()),
                chain.seed(),
                Which::Primary,
                input,
            );
            chain.absorb(hash);
        }
        let end = tick_end(chain.seed());

        Ok(end.saturating_sub(begin))
    }

    /// Total ticks for the whole run of fingerprint calls.
    pub fn aggregate_fingerprint(
        &self,
        lengths: &[usize],
        num_trials: usize,
        max_len: usize,
    ) -> Result<u64> {
        self.check_request(lengths, num_trials, max_len)?;
        let (_pin, buf) = self.setup(BenchMode::AggregateFingerprint, num_trials, max_len);
        let mask = self.config.jitter_mask;
        let mut chain = Chain::new();

        let begin = tick_begin(chain.value_mut());
        chain.absorb(begin);
        for &len in lengths {
            // SAFETY: see `aggregate_full`.
            let input = unsafe { buf.window_unchecked(chain.offset(mask), len) };
            let fp = self
                .primitive
                .fingerprint(self.pool.select(chain.seed()), chain.seed(), input);
            chain.absorb(fp.fold());
        }
        let end = tick_end(chain.seed());

        Ok(end.saturating_sub(begin))
    }

    /// Ticks for each full-hash call, written to `timings` in `lengths` order.
    pub fn individual_full(
        &self,
        timings: &mut [u64],
        lengths: &[usize],
        num_trials: usize,
        max_len: usize,
    ) -> Result<()> {
        self.check_timings(timings, num_trials)?;
        self.check_request(lengths, num_trials, max_len)?;
        let (_pin, buf) = self.setup(BenchMode::IndividualFull, num_trials, max_len);
        let mask = self.config.jitter_mask;
        let mut chain = Chain::new();

        for (slot, &len) in timings.iter_mut().zip(lengths) {
            let begin = tick_begin(chain.value_mut());
            chain.absorb(begin);

            // SAFETY: see `aggregate_full`.
            let input = unsafe { buf.window_unchecked(chain.offset(mask), len) };
            let hash = self.primitive.full(
                self.pool.select(chain.seed()),
                chain.seed(),
                Which::Primary,
                input,
            );

            let end = tick_end(hash);
            chain.absorb(hash.wrapping_add(end));

            *slot = end.saturating_sub(begin);
        }

        Ok(())
    }

    /// Ticks for each fingerprint call, written to `timings` in `lengths` order.
    pub fn individual_fingerprint(
        &self,
        timings: &mut [u64],
        lengths: &[usize],
        num_trials: usize,
        max_len: usize,
    ) -> Result<()> {
        self.check_timings(timings, num_trials)?;
        self.check_request(lengths, num_trials, max_len)?;
        let (_pin, buf) = self.setup(BenchMode::IndividualFingerprint, num_trials, max_len);
        let mask = self.config.jitter_mask;
        let mut chain = Chain::new();

        for (slot, &len) in timings.iter_mut().zip(lengths) {
            let begin = tick_begin(chain.value_mut());
            chain.absorb(begin);

            // SAFETY: see `aggregate_full`.
            let input = unsafe { buf.window_unchecked(chain.offset(mask), len) };
            let fp = self
                .primitive
                .fingerprint(self.pool.select(chain.seed()), chain.seed(), input);

            let hash = fp.fold();
            let end = tick_end(hash);
            chain.absorb(hash.wrapping_add(end));

            *slot = end.saturating_sub(begin);
        }

        Ok(())
    }

    /// Run `mode` with one trial per entry of `lengths`.
    pub fn run(&self, mode: BenchMode, lengths: &[usize], max_len: usize) -> Result<Timings> {
        let num_trials = lengths.len();
        match mode {
            BenchMode::AggregateFull => self
                .aggregate_full(lengths, num_trials, max_len)
                .map(Timings::Aggregate),
            BenchMode::AggregateFingerprint => self
                .aggregate_fingerprint(lengths, num_trials, max_len)
                .map(Timings::Aggregate),
            BenchMode::IndividualFull => {
                let mut timings = vec![0; num_trials];
                self.individual_full(&mut timings, lengths, num_trials, max_len)?;
                Ok(Timings::PerTrial(timings))
            }
            BenchMode::IndividualFingerprint => {
                let mut timings = vec![0; num_trials];
                self.individual_fingerprint(&mut timings, lengths, num_trials, max_len)?;
                Ok(Timings::PerTrial(timings))
            }
        }
    }
}
