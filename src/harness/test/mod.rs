//! Tests for the benchmark modes.
//!
//! `Recorder` stands in for the hash primitive and logs every call, so the
//! chain mechanics (offsets, parameter selection, seeds) can be checked
//! from outside the timed loop.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::primitive::code::available_variants;
use crate::primitive::{Fingerprint, MixHash};
use crate::utils::buffer::buffer_size;
use crate::workload::Workload;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Call {
    /// Input address.
    addr: usize,
    /// Distance from the previous 64-byte boundary, i.e. the jitter offset.
    offset: usize,
    len: usize,
    seed: u64,
    /// Derivation seed of the parameter set used.
    params: u64,
    output: u64,
}

/// Murmur3 finaliser, so outputs do not inherit the parity of the seed.
fn mix(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

/// Hash primitive that records its calls and returns either a fixed
/// function of its inputs or values from an RNG.
struct Recorder {
    calls: RefCell<Vec<Call>>,
    rng: Option<RefCell<StdRng>>,
}

impl Recorder {
    fn deterministic() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            rng: None,
        }
    }

    fn with_entropy(seed: u64) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            rng: Some(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn output(&self, params: u64, seed: u64, len: usize) -> u64 {
        match &self.rng {
            Some(rng) => rng.borrow_mut().random(),
            None => mix(seed ^ params ^ len as u64),
        }
    }

    fn record(&self, params: u64, seed: u64, data: &[u8], output: u64) {
        assert!(data.iter().all(|&b| b == 0x42), "input bytes were modified");
        self.calls.borrow_mut().push(Call {
            addr: data.as_ptr() as usize,
            offset: data.as_ptr() as usize % 64,
            len: data.len(),
            seed,
            params,
            output,
        });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl HashPrimitive for &Recorder {
    type Params = u64;

    fn derive_params(&self, seed: u64, _key: Option<&[u8; 32]>) -> u64 {
        seed
    }

    fn full(&self, params: &u64, seed: u64, which: Which, data: &[u8]) -> u64 {
        assert_eq!(which, Which::Primary);
        let output = self.output(*params, seed, data.len());
        self.record(*params, seed, data, output);
        output
    }

    fn fingerprint(&self, params: &u64, seed: u64, data: &[u8]) -> Fingerprint {
        let hi = self.output(*params, seed, data.len());
        let lo = self.output(*params, !seed, data.len());
        self.record(*params, seed, data, hi ^ lo);
        Fingerprint { hash: [hi, lo] }
    }
}

fn quiet_config() -> BenchConfig {
    BenchConfig {
        pin_strategy: PinStrategy::None,
        ..BenchConfig::default()
    }
}

fn recorder_harness<'a>(
    recorder: &'a Recorder,
    pool: &'a ParamPool<u64>,
) -> Harness<'a, &'a Recorder> {
    Harness::new(recorder, pool, quiet_config()).unwrap()
}

fn check_chain_invariants(calls: &[Call], config: &BenchConfig) {
    for call in calls {
        assert_eq!(call.offset as u64, call.seed & config.jitter_mask);
        assert_eq!(call.params, config.param_seeds[(call.seed & 1) as usize]);
    }
}

#[test]
fn test_individual_full_end_to_end() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let harness = Harness::new(MixHash::default(), &pool, BenchConfig::default()).unwrap();
    let lengths = [0, 8, 64, 1024];
    let mut timings = [u64::MAX; 4];

    harness
        .individual_full(&mut timings, &lengths, 4, 1024)
        .unwrap();

    assert!(timings.iter().all(|&t| t != u64::MAX), "every slot written");
}

#[test]
fn test_inputs_stay_inside_one_aligned_buffer() {
    let recorder = Recorder::with_entropy(11);
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let config = harness.config().clone();
    let lengths: Vec<usize> = [0, 8, 64, 1024].repeat(64);
    let mut timings = vec![0u64; lengths.len()];

    harness
        .individual_full(&mut timings, &lengths, lengths.len(), 1024)
        .unwrap();

    let calls = recorder.calls();
    // Offsets stay below the alignment, so every input starts in the
    // buffer's first alignment unit.
    let base = calls[0].addr & !(config.alignment - 1);
    let size = buffer_size(1024, config.alignment, config.jitter_margin);
    for call in &calls {
        assert_eq!(call.addr & !(config.alignment - 1), base, "inputs span two buffers");
        assert_eq!(call.addr - base, call.offset);
        assert!(call.addr + call.len <= base + size, "read past the buffer");
    }

    // Full-length inputs at non-zero offsets reach past max_len, so the
    // allocation really carries the jitter margin.
    let furthest = calls.iter().map(|c| c.addr + c.len - base).max().unwrap();
    assert!(furthest > 1024, "no input used the jitter margin");
}

#[test]
fn test_individual_preserves_input_order() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = [5, 0, 100, 3, 64, 17];
    let mut timings = [0u64; 6];

    harness
        .individual_full(&mut timings, &lengths, 6, 100)
        .unwrap();

    let recorded: Vec<usize> = recorder.calls().iter().map(|c| c.len).collect();
    assert_eq!(recorded, lengths);
}

#[test]
fn test_fingerprint_modes_preserve_input_order() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = [9, 1, 33];
    let mut timings = [0u64; 3];

    harness
        .individual_fingerprint(&mut timings, &lengths, 3, 40)
        .unwrap();
    harness.aggregate_fingerprint(&lengths, 3, 40).unwrap();

    let recorded: Vec<usize> = recorder.calls().iter().map(|c| c.len).collect();
    assert_eq!(recorded, [9, 1, 33, 9, 1, 33]);
}

#[test]
fn test_aggregate_zero_trials() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let harness = Harness::new(MixHash::default(), &pool, quiet_config()).unwrap();

    let full = harness.aggregate_full(&[], 0, 0).unwrap();
    let fp = harness.aggregate_fingerprint(&[], 0, 0).unwrap();
    assert!(full < u64::MAX / 2, "underflow in empty aggregate: {}", full);
    assert!(fp < u64::MAX / 2, "underflow in empty aggregate: {}", fp);

    let single = harness.aggregate_full(&[0], 1, 0).unwrap();
    assert!(single < u64::MAX / 2);
}

#[test]
fn test_individual_requires_trials() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);

    assert_eq!(harness.individual_full(&mut [], &[], 0, 0), Err(Error::NoTrials));
    assert_eq!(
        harness.individual_fingerprint(&mut [], &[], 0, 0),
        Err(Error::NoTrials)
    );
}

#[test]
fn test_preconditions_fail_before_any_call() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);

    assert_eq!(
        harness.aggregate_full(&[1, 2, 3], 2, 10),
        Err(Error::TrialCountMismatch {
            what: "lengths",
            expected: 2,
            actual: 3
        })
    );
    assert_eq!(
        harness.aggregate_fingerprint(&[1, 20, 3], 3, 10),
        Err(Error::LengthExceedsMax {
            index: 1,
            len: 20,
            max_len: 10
        })
    );
    assert_eq!(
        harness.individual_full(&mut [0; 2], &[1, 2, 3], 3, 10),
        Err(Error::TrialCountMismatch {
            what: "timings",
            expected: 3,
            actual: 2
        })
    );
    assert!(matches!(
        harness.individual_fingerprint(&mut [0; 1], &[usize::MAX], 1, usize::MAX),
        Err(Error::InvalidConfig(_))
    ));

    assert!(recorder.calls().is_empty(), "no call may run on a bad request");
}

#[test]
fn test_invalid_config_rejected() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let config = BenchConfig {
        jitter_mask: 255,
        ..BenchConfig::default()
    };
    assert!(matches!(
        Harness::new(MixHash::default(), &pool, config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_oversized_margin_rejected() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let config = BenchConfig {
        jitter_margin: usize::MAX,
        pin_strategy: PinStrategy::None,
        ..BenchConfig::default()
    };
    assert!(matches!(
        Harness::new(&recorder, &pool, config),
        Err(Error::InvalidConfig(_))
    ));

    // A large margin that still fits shrinks the supported max_len.
    let config = BenchConfig {
        jitter_margin: 1 << 40,
        pin_strategy: PinStrategy::None,
        ..BenchConfig::default()
    };
    let harness = Harness::new(&recorder, &pool, config).unwrap();
    let max_len = isize::MAX as usize - (1 << 40);
    assert!(matches!(
        harness.aggregate_full(&[8], 1, max_len),
        Err(Error::InvalidConfig(_))
    ));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_pool_must_match_config_seeds() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let config = BenchConfig {
        param_seeds: [1, 2],
        ..quiet_config()
    };
    assert!(matches!(
        Harness::new(MixHash::default(), &pool, config.clone()),
        Err(Error::InvalidConfig(_))
    ));

    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, config.param_seeds);
    let harness = Harness::new(&recorder, &pool, config).unwrap();
    let lengths = vec![4; 256];
    harness.aggregate_full(&lengths, 256, 4).unwrap();

    let calls = recorder.calls();
    check_chain_invariants(&calls, harness.config());
    assert!(calls.iter().all(|c| c.params == 1 || c.params == 2));
}

#[test]
fn test_chain_drives_offset_and_params() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = vec![16; 256];
    let mut timings = vec![0u64; 256];

    harness
        .individual_full(&mut timings, &lengths, 256, 16)
        .unwrap();
    harness.aggregate_full(&lengths, 256, 16).unwrap();

    let calls = recorder.calls();
    check_chain_invariants(&calls, harness.config());

    // Both parameter sets and many offsets get exercised.
    assert!(calls.iter().any(|c| c.params == 42));
    assert!(calls.iter().any(|c| c.params == 43));
    let mut offsets: Vec<usize> = calls.iter().map(|c| c.offset).collect();
    offsets.sort_unstable();
    offsets.dedup();
    assert!(offsets.len() > 16, "only {} distinct offsets", offsets.len());
}

#[test]
fn test_aggregate_chain_adds_hash_outputs() {
    // No tick is read between aggregate trials, so each seed is exactly the
    // previous seed plus the previous output.
    let recorder = Recorder::with_entropy(7);
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = vec![8; 64];

    harness.aggregate_full(&lengths, 64, 8).unwrap();
    harness.aggregate_fingerprint(&lengths, 64, 8).unwrap();

    let calls = recorder.calls();
    for run in calls.chunks(64) {
        for pair in run.windows(2) {
            assert_eq!(pair[1].seed, pair[0].seed.wrapping_add(pair[0].output));
        }
    }
}

#[test]
fn test_individual_seeds_never_repeat() {
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = vec![0; 128];
    let mut timings = vec![0u64; 128];

    harness
        .individual_fingerprint(&mut timings, &lengths, 128, 0)
        .unwrap();

    let mut seeds: Vec<u64> = recorder.calls().iter().map(|c| c.seed).collect();
    seeds.sort_unstable();
    seeds.dedup();
    assert_eq!(seeds.len(), 128);
}

#[test]
fn test_addresses_not_a_function_of_lengths() {
    // Same lengths, same primitive: the tick values folded into the chain
    // make the two runs diverge.
    let recorder = Recorder::deterministic();
    let pool = ParamPool::derive(&&recorder, DEFAULT_PARAM_SEEDS);
    let harness = recorder_harness(&recorder, &pool);
    let lengths = vec![32; 64];
    let mut timings = vec![0u64; 64];

    harness
        .individual_full(&mut timings, &lengths, 64, 32)
        .unwrap();
    harness
        .individual_full(&mut timings, &lengths, 64, 32)
        .unwrap();

    let calls = recorder.calls();
    let (first, second) = calls.split_at(64);
    let seeds = |run: &[Call]| run.iter().map(|c| c.seed).collect::<Vec<_>>();
    let picks = |run: &[Call]| run.iter().map(|c| (c.offset, c.params)).collect::<Vec<_>>();
    assert_ne!(seeds(first), seeds(second));
    assert_ne!(picks(first), picks(second));
}

#[test]
fn test_external_entropy_changes_addresses() {
    let a = Recorder::with_entropy(1);
    let b = Recorder::with_entropy(2);
    let pool = ParamPool::derive(&&a, DEFAULT_PARAM_SEEDS);
    let lengths = vec![4; 64];

    recorder_harness(&a, &pool).aggregate_full(&lengths, 64, 4).unwrap();
    recorder_harness(&b, &pool).aggregate_full(&lengths, 64, 4).unwrap();

    let picks = |r: &Recorder| {
        r.calls()
            .iter()
            .skip(1)
            .map(|c| (c.offset, c.params))
            .collect::<Vec<_>>()
    };
    assert_ne!(picks(&a), picks(&b));
}

#[test]
fn test_max_len_inputs_with_every_mask() {
    // Exercises the buffer's debug bounds check at every jitter offset.
    let recorder = Recorder::with_entropy(3);
    for (margin, mask) in [(64, 63), (64, 64), (128, 127), (64, 0)] {
        let config = BenchConfig {
            jitter_margin: margin,
            jitter_mask: mask,
            pin_strategy: PinStrategy::None,
            ..BenchConfig::default()
        };
        let pool = ParamPool::derive(&&recorder, config.param_seeds);
        let harness = Harness::new(&recorder, &pool, config).unwrap();
        let lengths = vec![100; 512];
        let mut timings = vec![0u64; 512];
        harness
            .individual_full(&mut timings, &lengths, 512, 100)
            .unwrap();
    }
}

#[test]
fn test_run_dispatch() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let harness = Harness::new(MixHash::default(), &pool, quiet_config()).unwrap();
    let lengths = [1, 2, 3, 200];

    for mode in BenchMode::ALL {
        let timings = harness.run(mode, &lengths, 200).unwrap();
        if mode.is_per_trial() {
            assert_eq!(timings.per_trial().map(<[u64]>::len), Some(4));
        } else {
            assert!(timings.aggregate().is_some());
        }
    }
}

#[test]
fn test_random_workloads() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let harness = Harness::new(MixHash::default(), &pool, BenchConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(0xbe4c);

    for _ in 0..10 {
        let max_len = rng.random_range(0..2048);
        let count = rng.random_range(1..200);
        let workload = Workload::uniform(&mut rng, count, max_len);
        let mut timings = vec![0u64; count];
        harness
            .individual_fingerprint(&mut timings, workload.lengths(), count, max_len)
            .unwrap();
        harness
            .aggregate_full(workload.lengths(), count, max_len)
            .unwrap();
    }
}

#[test]
fn test_interleaved_workload_split() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    let harness = Harness::new(MixHash::default(), &pool, quiet_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    let workload = Workload::interleaved(&mut rng, 8, 512, 100);

    let timings = harness
        .run(BenchMode::IndividualFull, workload.lengths(), workload.max_len())
        .unwrap();
    let (a, b) = workload.split(timings.per_trial().unwrap()).unwrap();
    assert_eq!((a.len(), b.len()), (100, 100));
}

#[test]
fn test_every_variant_runs() {
    for variant in available_variants() {
        let pool = ParamPool::derive(&variant.function, DEFAULT_PARAM_SEEDS);
        let harness = Harness::new(variant.function, &pool, quiet_config()).unwrap();
        for mode in BenchMode::ALL {
            assert!(
                harness.run(mode, &[0, 8, 64, 1024], 1024).is_ok(),
                "variant {} failed in {}",
                variant.name,
                mode.name()
            );
        }
    }
}

#[test]
fn test_pool_shared_between_threads() {
    let pool = ParamPool::derive(&MixHash::default(), DEFAULT_PARAM_SEEDS);
    std::thread::scope(|s| {
        for _ in 0..2 {
            s.spawn(|| {
                let harness = Harness::new(MixHash::default(), &pool, quiet_config()).unwrap();
                harness.aggregate_full(&[16; 32], 32, 16).unwrap();
            });
        }
    });
}
