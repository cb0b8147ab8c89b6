//! Mix hash implementations.
//!
//! This module contains all implementation variants of the mix hash.

pub mod c_impl;
mod original;

pub use c_impl::{mix_fingerprint_c, mix_full_c, COMPILER_NAME, C_IMPL_AVAILABLE};
pub use original::{mix_fingerprint_original, mix_full_original};

use super::MixHash;
use crate::utils::VariantInfo;

/// Get all available variants for the current build
pub fn available_variants() -> Vec<VariantInfo<MixHash>> {
    let mut variants = vec![VariantInfo {
        name: "original",
        description: "Clean, idiomatic Rust reference implementation",
        function: MixHash::ORIGINAL,
    }];

    if C_IMPL_AVAILABLE {
        log::debug!("C variant compiled with {}", COMPILER_NAME.unwrap_or("unknown"));
        variants.push(VariantInfo {
            name: "c-original",
            description: "C implementation of the mix hash",
            function: MixHash {
                full: mix_full_c,
                fingerprint: mix_fingerprint_c,
            },
        });
    } else {
        log::warn!("C variant not compiled; only 'original' is available");
    }

    variants
}
