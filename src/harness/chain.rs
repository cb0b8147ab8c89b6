//! The seed chain threading a data dependency through every trial.
//!
//! Each trial's parameter set, input offset and seed argument are all read
//! from one accumulator, and the accumulator only moves forward by adding
//! tick values and hash outputs. Trial `i` therefore cannot start until trial
//! `i - 1` has produced its hash, and the hardware never sees two trials it
//! could overlap or prefetch for.
//!
//! The input bytes are never rewritten between trials: doing so would add a
//! store-forwarding stall that real callers hashing fresh data do not pay.

/// Running chain value. Starts at zero and is never reset during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    seed: u64,
}

impl Chain {
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Current value, passed as the hash seed argument.
    #[inline(always)]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw access for `tick_begin`, which takes the chain as an asm operand.
    #[inline(always)]
    pub fn value_mut(&mut self) -> &mut u64 {
        &mut self.seed
    }

    /// Byte offset of the next input inside the working buffer.
    #[inline(always)]
    pub const fn offset(&self, jitter_mask: u64) -> usize {
        (self.seed & jitter_mask) as usize
    }

    /// Fold a tick value or hash output into the chain.
    #[inline(always)]
    pub fn absorb(&mut self, value: u64) {
        self.seed = self.seed.wrapping_add(value);
    }
}
