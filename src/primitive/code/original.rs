//! Pure Rust mix hash.

use crate::primitive::{Fingerprint, MixParams, Which, NH_COUNT};

const LEN_MUL: u64 = 0x9E37_79B9_7F4A_7C15;

/// Key schedule offset of the secondary lane.
const SECONDARY_SHIFT: usize = 4;

#[inline(always)]
fn load_word(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

#[inline(always)]
fn mix_round(acc: u64, word: u64, key: u64, mul: u64) -> u64 {
    (acc ^ word.wrapping_add(key)).wrapping_mul(mul).rotate_left(31)
}

#[inline(always)]
fn key_at(params: &MixParams, word_index: usize, lane: usize) -> u64 {
    params.nh[(word_index + lane * SECONDARY_SHIFT) & (NH_COUNT - 1)]
}

/// murmur3 64-bit finaliser
#[inline(always)]
fn fmix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

/// Full hash: one multiply-rotate round per little-endian 8-byte word,
/// the last word zero-padded.
pub fn mix_full_original(params: &MixParams, seed: u64, which: Which, data: &[u8]) -> u64 {
    let lane = which.index();
    let mul = params.poly[lane];
    let mut acc = seed ^ (data.len() as u64).wrapping_mul(LEN_MUL);

    for (i, chunk) in data.chunks(8).enumerate() {
        acc = mix_round(acc, load_word(chunk), key_at(params, i, lane), mul);
    }

    fmix64(acc)
}

/// Fingerprint: both lanes in a single pass over `data`.
///
/// `hash[w]` equals `mix_full_original` with the matching `which`.
pub fn mix_fingerprint_original(params: &MixParams, seed: u64, data: &[u8]) -> Fingerprint {
    let init = seed ^ (data.len() as u64).wrapping_mul(LEN_MUL);
    let mut acc = [init, init];

    for (i, chunk) in data.chunks(8).enumerate() {
        let word = load_word(chunk);
        acc[0] = mix_round(acc[0], word, key_at(params, i, 0), params.poly[0]);
        acc[1] = mix_round(acc[1], word, key_at(params, i, 1), params.poly[1]);
    }

    Fingerprint {
        hash: [fmix64(acc[0]), fmix64(acc[1])],
    }
}
