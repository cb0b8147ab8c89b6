//! Utility modules for timing and buffer management.

pub mod buffer;
pub mod cpu_affinity;
pub mod cycles;

// Re-export commonly used items
pub use buffer::{buffer_size, AlignedBuffer};
pub use cpu_affinity::CpuPinGuard;
pub use cycles::{measure_cycles, tick_begin, tick_end, timer_overhead, unit_name};

/// Information about an implementation variant.
/// Generic over F which is the implementation type.
pub struct VariantInfo<F> {
    /// Unique identifier for this variant (e.g., "original", "c-original")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// The specific implementation
    pub function: F,
}
