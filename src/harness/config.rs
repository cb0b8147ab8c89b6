//! Run configuration.

use crate::error::{Error, Result};

/// Default parameter derivation seeds for the two pool slots.
pub const DEFAULT_PARAM_SEEDS: [u64; 2] = [42, 43];

/// CPU pinning strategy during a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinStrategy {
    /// Leave scheduling to the OS
    None,
    /// Pin the calling thread for the duration of each benchmark run
    #[default]
    PerRun,
}

/// Configuration shared by all benchmark modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    /// Working buffer alignment in bytes (default: 64)
    pub alignment: usize,
    /// Extra bytes past `max_len` reserved for jitter offsets (default: 64)
    pub jitter_margin: usize,
    /// Mask applied to the chain value to get each trial's offset (default: 63)
    pub jitter_mask: u64,
    /// Byte the working buffer is filled with (default: 0x42)
    pub fill_byte: u8,
    /// Derivation seeds of the two parameter sets (default: [42, 43])
    pub param_seeds: [u64; 2],
    /// CPU pinning strategy (default: PerRun)
    pub pin_strategy: PinStrategy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            alignment: 64,
            jitter_margin: 64,
            jitter_mask: 63,
            fill_byte: 0x42,
            param_seeds: DEFAULT_PARAM_SEEDS,
            pin_strategy: PinStrategy::default(),
        }
    }
}

impl BenchConfig {
    /// Reject configurations that could read past the working buffer or
    /// collapse the parameter pool to a single set.
    pub fn validate(&self) -> Result<()> {
        if !self.alignment.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "alignment {} is not a power of two",
                self.alignment
            )));
        }
        if self.buffer_overhead().is_none() {
            return Err(Error::InvalidConfig(format!(
                "jitter_margin {} plus alignment {} leaves no room for a buffer",
                self.jitter_margin, self.alignment
            )));
        }
        if self.jitter_mask > self.jitter_margin as u64 {
            return Err(Error::InvalidConfig(format!(
                "jitter_mask {:#x} can produce offsets past jitter_margin {}",
                self.jitter_mask, self.jitter_margin
            )));
        }
        if self.param_seeds[0] == self.param_seeds[1] {
            return Err(Error::InvalidConfig(format!(
                "both parameter sets use seed {}",
                self.param_seeds[0]
            )));
        }
        Ok(())
    }

    /// Largest `max_len` whose buffer size fits in a `Layout`, or 0 when
    /// the margin and alignment alone do not fit.
    pub fn max_supported_len(&self) -> usize {
        self.buffer_overhead()
            .and_then(|overhead| (isize::MAX as usize).checked_sub(overhead))
            .unwrap_or(0)
    }

    /// Bytes a buffer needs beyond `max_len` in the worst case, if that
    /// stays within `isize::MAX`.
    fn buffer_overhead(&self) -> Option<usize> {
        self.alignment
            .checked_mul(2)
            .and_then(|a| a.checked_add(self.jitter_margin))
            .filter(|&overhead| overhead <= isize::MAX as usize)
    }
}
