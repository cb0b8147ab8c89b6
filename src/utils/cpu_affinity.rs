//! Pinning the benchmarking thread to one CPU core.
//!
//! A migration in the middle of a run switches cycle counters and cold
//! caches, so each run can hold a [`CpuPinGuard`] for its duration. Only
//! Linux supports real pinning here; elsewhere the guard is a no-op.

#[cfg(target_os = "linux")]
mod platform {
    use std::cell::RefCell;

    // Guards may nest, so previous masks are kept as a stack.
    thread_local! {
        static SAVED_MASKS: RefCell<Vec<libc::cpu_set_t>> = const { RefCell::new(Vec::new()) };
    }

    pub fn current_cpu() -> Option<usize> {
        // SAFETY: no arguments, no memory access.
        let cpu = unsafe { libc::sched_getcpu() };
        usize::try_from(cpu).ok()
    }

    pub fn pin(core_id: usize) -> bool {
        // SAFETY: cpu_set_t is plain data; both calls get a correctly sized set.
        unsafe {
            let mut saved: libc::cpu_set_t = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut saved) != 0 {
                return false;
            }

            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
                return false;
            }

            SAVED_MASKS.with(|cell| cell.borrow_mut().push(saved));
            true
        }
    }

    pub fn unpin() -> bool {
        SAVED_MASKS.with(|cell| match cell.borrow_mut().pop() {
            // SAFETY: restoring a mask previously read by sched_getaffinity.
            Some(set) => unsafe {
                libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
            },
            None => false,
        })
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub fn current_cpu() -> Option<usize> {
        None
    }
    pub fn pin(_core_id: usize) -> bool {
        false
    }
    pub fn unpin() -> bool {
        true
    }
}

/// Core the calling thread is running on, when the platform can tell.
pub fn current_cpu() -> Option<usize> {
    platform::current_cpu()
}

/// RAII guard for CPU pinning - pins on creation, unpins on drop.
///
/// ```ignore
/// {
///     let _pin = CpuPinGuard::new(); // Thread pinned
///     // ... timed work ...
/// } // Original affinity restored here
/// ```
pub struct CpuPinGuard {
    pinned_core: Option<usize>,
}

impl CpuPinGuard {
    /// Pin to the core the thread is currently running on.
    pub fn new() -> Self {
        let pinned_core = current_cpu().filter(|&core| platform::pin(core));
        if pinned_core.is_none() {
            log::warn!("could not pin benchmark thread; timings may include migrations");
        }
        Self { pinned_core }
    }

    /// Get the core ID this thread is pinned to, if any.
    pub fn core_id(&self) -> Option<usize> {
        self.pinned_core
    }

    /// Check if the thread was successfully pinned.
    pub fn is_pinned(&self) -> bool {
        self.pinned_core.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if self.pinned_core.is_some() && !platform::unpin() {
            log::warn!("failed to restore CPU affinity");
        }
    }
}

impl Default for CpuPinGuard {
    fn default() -> Self {
        Self::new()
    }
}
