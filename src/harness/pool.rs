//! The two parameter sets shared by every benchmark run.

use crate::primitive::HashPrimitive;

/// Selects a pool slot from the chain value.
pub const PARAMS_MASK: u64 = 1;

/// Exactly two parameter sets, derived once and read-only afterwards.
///
/// Build one before benchmarking and pass it by reference; it is `Sync`
/// whenever the parameters are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamPool<P> {
    seeds: [u64; 2],
    sets: [P; 2],
}

impl<P> ParamPool<P> {
    /// Derive both sets from `seeds`, with no key material.
    pub fn derive<H>(primitive: &H, seeds: [u64; 2]) -> Self
    where
        H: HashPrimitive<Params = P>,
    {
        let sets = seeds.map(|seed| primitive.derive_params(seed, None));
        log::debug!("derived parameter pool from seeds {:?}", seeds);
        Self { seeds, sets }
    }

    /// Seeds the two sets were derived from.
    pub fn seeds(&self) -> [u64; 2] {
        self.seeds
    }

    /// Parameter set at `index` (0 or 1).
    ///
    /// # Panics
    /// Panics if `index > 1`.
    #[inline(always)]
    pub fn get(&self, index: usize) -> &P {
        &self.sets[index]
    }

    /// Parameter set picked by the low bit of `seed`.
    #[inline(always)]
    pub fn select(&self, seed: u64) -> &P {
        &self.sets[(seed & PARAMS_MASK) as usize]
    }
}
