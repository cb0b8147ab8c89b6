//! Hash primitive under test.
//!
//! The harness only needs a parameter derivation function and two call
//! shapes: a single-word "full" hash and a two-word fingerprint. Anything
//! implementing [`HashPrimitive`] can be timed.
//!
//! The crate ships one concrete primitive, the "mix hash", with a pure Rust
//! reference variant and an optional C variant built by `build.rs`.

pub mod code;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::error::{Error, Result};

/// Number of key words in a [`MixParams`] structure.
pub const NH_COUNT: usize = 32;

/// Key used by [`derive_params`] when the caller supplies none.
pub const DEFAULT_KEY: [u8; 32] = *b"Not a MAC key; benchmarking only";

/// Call-variant selector for the full hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Which {
    Primary = 0,
    Secondary = 1,
}

impl Which {
    /// Lane index (0 or 1).
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Two-word fingerprint output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Fingerprint {
    pub hash: [u64; 2],
}

impl Fingerprint {
    /// Combine both words into the single value fed to the seed chain.
    #[inline(always)]
    pub const fn fold(self) -> u64 {
        self.hash[0] ^ self.hash[1]
    }
}

/// Trait implemented by every primitive the harness can time.
///
/// `Params` is opaque to the harness: it is derived once per pool slot and
/// only ever read afterwards.
pub trait HashPrimitive {
    type Params;

    /// Derive a parameter structure from `seed` and an optional key.
    fn derive_params(&self, seed: u64, key: Option<&[u8; 32]>) -> Self::Params;

    /// Single 64-bit hash of `data`.
    fn full(&self, params: &Self::Params, seed: u64, which: Which, data: &[u8]) -> u64;

    /// 128-bit fingerprint of `data`.
    fn fingerprint(&self, params: &Self::Params, seed: u64, data: &[u8]) -> Fingerprint;
}

/// Parameters for the mix hash. Layout is shared with the C variant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct MixParams {
    /// Odd multipliers, one per lane.
    pub poly: [u64; 2],
    /// Per-word key material.
    pub nh: [u64; NH_COUNT],
}

/// Derive mix hash parameters.
///
/// The ChaCha20 key is `key` (or [`DEFAULT_KEY`]) and `seed` selects the
/// stream, so the output is a pure function of its arguments.
pub fn derive_params(seed: u64, key: Option<&[u8; 32]>) -> MixParams {
    let mut rng = ChaCha20Rng::from_seed(*key.unwrap_or(&DEFAULT_KEY));
    rng.set_stream(seed);

    let mut poly = [0u64; 2];
    for p in &mut poly {
        *p = rng.next_u64() | 1;
    }

    let mut nh = [0u64; NH_COUNT];
    for k in &mut nh {
        *k = rng.next_u64();
    }

    MixParams { poly, nh }
}

/// Signature of a full-hash implementation.
pub type FullFn = fn(&MixParams, u64, Which, &[u8]) -> u64;

/// Signature of a fingerprint implementation.
pub type FingerprintFn = fn(&MixParams, u64, &[u8]) -> Fingerprint;

/// One implementation of the mix hash: a pair of entry points.
#[derive(Clone, Copy, Debug)]
pub struct MixHash {
    pub full: FullFn,
    pub fingerprint: FingerprintFn,
}

impl MixHash {
    /// The pure Rust reference implementation.
    pub const ORIGINAL: MixHash = MixHash {
        full: code::mix_full_original,
        fingerprint: code::mix_fingerprint_original,
    };
}

impl Default for MixHash {
    fn default() -> Self {
        Self::ORIGINAL
    }
}

impl HashPrimitive for MixHash {
    type Params = MixParams;

    fn derive_params(&self, seed: u64, key: Option<&[u8; 32]>) -> MixParams {
        derive_params(seed, key)
    }

    #[inline(always)]
    fn full(&self, params: &MixParams, seed: u64, which: Which, data: &[u8]) -> u64 {
        (self.full)(params, seed, which, data)
    }

    #[inline(always)]
    fn fingerprint(&self, params: &MixParams, seed: u64, data: &[u8]) -> Fingerprint {
        (self.fingerprint)(params, seed, data)
    }
}

/// Check every available variant against the `original` one.
///
/// Covers every tail length around a few word boundaries, both lanes, and
/// both call shapes.
pub fn verify_variants() -> Result<()> {
    let variants = code::available_variants();
    let reference = variants
        .iter()
        .find(|v| v.name == "original")
        .ok_or_else(|| Error::Verification("no 'original' variant found".to_string()))?;

    let params = derive_params(7, None);
    let data: Vec<u8> = (0..300u32).map(|i| (i.wrapping_mul(37) ^ 0x5a) as u8).collect();
    let seeds = [0u64, 1, 0xdead_beef, u64::MAX];

    for variant in variants.iter().filter(|v| v.name != "original") {
        for len in 0..data.len() {
            let input = &data[..len];
            for &seed in &seeds {
                for which in [Which::Primary, Which::Secondary] {
                    let expected = (reference.function.full)(&params, seed, which, input);
                    let got = (variant.function.full)(&params, seed, which, input);
                    if got != expected {
                        return Err(Error::Verification(format!(
                            "variant '{}' full({:?}) mismatch at len {}: expected {:#x}, got {:#x}",
                            variant.name, which, len, expected, got
                        )));
                    }
                }

                let expected = (reference.function.fingerprint)(&params, seed, input);
                let got = (variant.function.fingerprint)(&params, seed, input);
                if got != expected {
                    return Err(Error::Verification(format!(
                        "variant '{}' fingerprint mismatch at len {}: expected {:x?}, got {:x?}",
                        variant.name, len, expected.hash, got.hash
                    )));
                }
            }
        }
        log::info!("variant '{}' matches 'original'", variant.name);
    }

    Ok(())
}
