//! Serializing cycle counter reads bounding a timed region.
//!
//! `tick_begin` and `tick_end` use different instruction sequences, following
//! Intel's guidance for benchmarking code execution times (Paoloni,
//! "How to Benchmark Code Execution Times on Intel IA-32 and IA-64
//! Instruction Set Architectures"):
//!
//! - begin: `CPUID; RDTSC`. CPUID drains everything issued before it, so
//!   earlier work cannot leak into the region.
//! - end: `RDTSCP; CPUID`. RDTSCP waits for the timed work to retire, and the
//!   trailing CPUID keeps later work from starting before the read.
//!
//! On aarch64 the virtual counter `CNTVCT_EL0` is read between `ISB`
//! barriers. It is a fixed-frequency timer, not a true cycle count.
//!
//! With the `use_time` feature, without `cpu_cycles`, or on any other
//! architecture, ticks are nanoseconds of a monotonic clock. That fallback is
//! much coarser and its numbers are not comparable with cycle counts.

#[cfg(all(
    feature = "cpu_cycles",
    not(feature = "use_time"),
    target_arch = "x86_64"
))]
mod imp {
    use core::arch::asm;

    /// Start-of-region counter read.
    ///
    /// `chain` is an in/out operand of the asm block: the read cannot start
    /// before the chain value exists, and nothing derived from the chain can
    /// be hoisted above it. The block also acts as a full compiler memory
    /// barrier.
    #[inline(always)]
    pub fn tick_begin(chain: &mut u64) -> u64 {
        let lo: u32;
        let hi: u32;
        // SAFETY: CPUID and RDTSC are unprivileged. rbx is reserved by LLVM,
        // so it is parked in a scratch register around CPUID.
        unsafe {
            asm!(
                "/* chain: {chain} */",
                "mov {rbx_save}, rbx",
                "cpuid",
                "mov rbx, {rbx_save}",
                "rdtsc",
                chain = inout(reg) *chain,
                rbx_save = out(reg) _,
                inout("eax") 0u32 => lo,
                inout("ecx") 0u32 => _,
                out("edx") hi,
                options(nostack),
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }

    /// End-of-region counter read.
    ///
    /// `pending` must be the last value computed by the timed work; feeding
    /// it to the asm block keeps that work on the timed side of the read.
    #[inline(always)]
    pub fn tick_end(pending: u64) -> u64 {
        let lo: u32;
        let hi: u32;
        // SAFETY: RDTSCP and CPUID are unprivileged; rbx is restored.
        unsafe {
            asm!(
                "/* pending: {pending} */",
                "rdtscp",
                "mov {lo:e}, eax",
                "mov {hi:e}, edx",
                "mov {rbx_save}, rbx",
                "xor eax, eax",
                "cpuid",
                "mov rbx, {rbx_save}",
                pending = in(reg) pending,
                lo = out(reg) lo,
                hi = out(reg) hi,
                rbx_save = out(reg) _,
                out("eax") _,
                out("ecx") _,
                out("edx") _,
                options(nostack),
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }
}

#[cfg(all(
    feature = "cpu_cycles",
    not(feature = "use_time"),
    target_arch = "aarch64"
))]
mod imp {
    use core::arch::asm;

    #[inline(always)]
    pub fn tick_begin(chain: &mut u64) -> u64 {
        let ticks: u64;
        // SAFETY: CNTVCT_EL0 is readable from EL0.
        unsafe {
            asm!(
                "/* chain: {chain} */",
                "isb",
                "mrs {ticks}, cntvct_el0",
                chain = inout(reg) *chain,
                ticks = out(reg) ticks,
                options(nostack),
            );
        }
        ticks
    }

    #[inline(always)]
    pub fn tick_end(pending: u64) -> u64 {
        let ticks: u64;
        // SAFETY: as above.
        unsafe {
            asm!(
                "/* pending: {pending} */",
                "isb",
                "mrs {ticks}, cntvct_el0",
                "isb",
                pending = in(reg) pending,
                ticks = out(reg) ticks,
                options(nostack),
            );
        }
        ticks
    }
}

#[cfg(not(all(
    feature = "cpu_cycles",
    not(feature = "use_time"),
    any(target_arch = "x86_64", target_arch = "aarch64")
)))]
mod imp {
    use std::hint::black_box;
    use std::sync::atomic::{compiler_fence, Ordering};
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();

    #[inline(always)]
    fn now_ns() -> u64 {
        EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }

    #[inline(always)]
    pub fn tick_begin(chain: &mut u64) -> u64 {
        let value = black_box(*chain);
        compiler_fence(Ordering::SeqCst);
        let ticks = now_ns();
        compiler_fence(Ordering::SeqCst);
        *chain = black_box(value);
        ticks
    }

    #[inline(always)]
    pub fn tick_end(pending: u64) -> u64 {
        black_box(pending);
        compiler_fence(Ordering::SeqCst);
        let ticks = now_ns();
        compiler_fence(Ordering::SeqCst);
        ticks
    }
}

pub use imp::{tick_begin, tick_end};

/// Get the tick unit name
pub const fn unit_name() -> &'static str {
    #[cfg(all(
        feature = "cpu_cycles",
        not(feature = "use_time"),
        target_arch = "x86_64"
    ))]
    {
        "cycles"
    }
    #[cfg(all(
        feature = "cpu_cycles",
        not(feature = "use_time"),
        target_arch = "aarch64"
    ))]
    {
        "ticks"
    }
    #[cfg(not(all(
        feature = "cpu_cycles",
        not(feature = "use_time"),
        any(target_arch = "x86_64", target_arch = "aarch64")
    )))]
    {
        "ns"
    }
}

/// Smallest tick count observed for an empty begin/end pair.
///
/// Returns 0 when `samples` is 0.
pub fn timer_overhead(samples: usize) -> u64 {
    let mut chain = 0u64;
    let mut best: Option<u64> = None;
    for _ in 0..samples {
        let begin = tick_begin(&mut chain);
        let end = tick_end(chain);
        chain = chain.wrapping_add(end);
        let elapsed = end.saturating_sub(begin);
        best = Some(best.map_or(elapsed, |b| b.min(elapsed)));
    }
    best.unwrap_or(0)
}

/// Measure ticks for a closure
#[inline(always)]
pub fn measure_cycles<F, R>(f: F) -> (u64, R)
where
    F: FnOnce() -> R,
{
    let mut chain = 0u64;
    let begin = tick_begin(&mut chain);
    let result = std::hint::black_box(f());
    let end = tick_end(chain);
    (end.saturating_sub(begin), result)
}
