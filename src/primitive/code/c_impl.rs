//! FFI bindings for the C implementation of the mix hash.

use crate::primitive::{Fingerprint, MixParams, Which};

#[cfg(c_implementation_active)]
mod ffi {
    use crate::primitive::MixParams;
    use libc::size_t;

    extern "C" {
        pub fn mix_full_c(
            params: *const MixParams,
            seed: u64,
            which: u32,
            data: *const u8,
            len: size_t,
        ) -> u64;
        pub fn mix_fingerprint_c(
            params: *const MixParams,
            seed: u64,
            data: *const u8,
            len: size_t,
            out: *mut u64,
        );
    }
}

/// C full hash wrapper
#[cfg(c_implementation_active)]
pub fn mix_full_c(params: &MixParams, seed: u64, which: Which, data: &[u8]) -> u64 {
    // SAFETY: `params` is repr(C) and matches `struct mix_params`; `data` is
    // valid for `data.len()` bytes.
    unsafe { ffi::mix_full_c(params, seed, which as u32, data.as_ptr(), data.len()) }
}

/// C fingerprint wrapper
#[cfg(c_implementation_active)]
pub fn mix_fingerprint_c(params: &MixParams, seed: u64, data: &[u8]) -> Fingerprint {
    let mut fp = Fingerprint::default();
    // SAFETY: as above; `out` points at two writable u64 words.
    unsafe {
        ffi::mix_fingerprint_c(params, seed, data.as_ptr(), data.len(), fp.hash.as_mut_ptr());
    }
    fp
}

/// Check if the C implementation is available
#[cfg(c_implementation_active)]
pub const C_IMPL_AVAILABLE: bool = true;

#[cfg(not(c_implementation_active))]
pub const C_IMPL_AVAILABLE: bool = false;

/// Name of the C compiler used
#[cfg(c_implementation_active)]
pub const COMPILER_NAME: Option<&str> = Some(env!("C_COMPILER_NAME"));

#[cfg(not(c_implementation_active))]
pub const COMPILER_NAME: Option<&str> = None;

// Stubs for missing C compiler
#[cfg(not(c_implementation_active))]
pub fn mix_full_c(_params: &MixParams, _seed: u64, _which: Which, _data: &[u8]) -> u64 {
    panic!("C implementation not compiled (requires GCC/Clang/MSVC)")
}

#[cfg(not(c_implementation_active))]
pub fn mix_fingerprint_c(_params: &MixParams, _seed: u64, _data: &[u8]) -> Fingerprint {
    panic!("C implementation not compiled (requires GCC/Clang/MSVC)")
}
