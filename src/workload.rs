//! Input-length sequences for benchmark runs.
//!
//! Comparing two input lengths is done within a single run: trials of both
//! classes are shuffled together, so slow periods (interrupts, frequency
//! changes) hit both classes alike. [`Workload::split`] then separates the
//! per-trial timings again.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// Which side of a two-class comparison a trial belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Class {
    A,
    B,
}

/// A length per trial, with its class and the maximum length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    lengths: Vec<usize>,
    classes: Vec<Class>,
    max_len: usize,
}

impl Workload {
    /// `per_class` trials of length `a_len` and as many of `b_len`, in random
    /// order.
    pub fn interleaved<R: Rng + ?Sized>(
        rng: &mut R,
        a_len: usize,
        b_len: usize,
        per_class: usize,
    ) -> Self {
        let mut classes: Vec<Class> = std::iter::repeat(Class::A)
            .take(per_class)
            .chain(std::iter::repeat(Class::B).take(per_class))
            .collect();
        classes.shuffle(rng);

        let lengths = classes
            .iter()
            .map(|class| match class {
                Class::A => a_len,
                Class::B => b_len,
            })
            .collect();

        Self {
            lengths,
            classes,
            max_len: a_len.max(b_len),
        }
    }

    /// `count` lengths drawn uniformly from `0..=max_len`, all in class A.
    pub fn uniform<R: Rng + ?Sized>(rng: &mut R, count: usize, max_len: usize) -> Self {
        let lengths = (0..count).map(|_| rng.random_range(0..=max_len)).collect();
        Self {
            lengths,
            classes: vec![Class::A; count],
            max_len,
        }
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn num_trials(&self) -> usize {
        self.lengths.len()
    }

    /// Separate per-trial timings into (class A, class B), keeping trial order
    /// within each class.
    pub fn split(&self, timings: &[u64]) -> Result<(Vec<u64>, Vec<u64>)> {
        if timings.len() != self.lengths.len() {
            return Err(Error::TrialCountMismatch {
                what: "timings",
                expected: self.lengths.len(),
                actual: timings.len(),
            });
        }

        let mut a = Vec::new();
        let mut b = Vec::new();
        for (&class, &ticks) in self.classes.iter().zip(timings) {
            match class {
                Class::A => a.push(ticks),
                Class::B => b.push(ticks),
            }
        }
        Ok((a, b))
    }
}
