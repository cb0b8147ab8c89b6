//! Aligned working buffer for the benchmark modes.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

use crate::harness::config::BenchConfig;

/// Bytes to allocate so that any jitter offset up to `jitter_margin` plus any
/// length up to `max_len` stays in bounds.
///
/// Always a multiple of `alignment` and strictly greater than
/// `max_len + jitter_margin`.
pub fn buffer_size(max_len: usize, alignment: usize, jitter_margin: usize) -> usize {
    alignment * (1 + (max_len + jitter_margin) / alignment)
}

/// Heap region aligned to `config.alignment`, filled once with
/// `config.fill_byte` and never written again.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate a buffer able to serve any input of up to `max_len` bytes at
    /// any jitter offset allowed by `config`.
    ///
    /// `config` must have passed [`BenchConfig::validate`]. Allocation
    /// failure aborts the process.
    pub fn for_lengths(max_len: usize, config: &BenchConfig) -> Self {
        let size = buffer_size(max_len, config.alignment, config.jitter_margin);
        let layout = Layout::from_size_align(size, config.alignment).unwrap_or_else(|_| {
            log::error!("no valid layout for {} bytes at align {}", size, config.alignment);
            std::process::abort()
        });

        // SAFETY: `size` is non-zero (at least one alignment unit).
        let raw = unsafe { alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };

        // SAFETY: `ptr` is valid for `size` bytes; filling all of them means
        // no uninitialised byte is ever read.
        unsafe { ptr.as_ptr().write_bytes(config.fill_byte, size) };

        log::debug!(
            "allocated {} byte buffer (align {}) for max_len {}",
            size,
            config.alignment,
            max_len
        );

        Self { ptr, layout }
    }

    /// Allocated size in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the allocation is initialised and lives as long as `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// `len` bytes starting `offset` bytes into the buffer, without a bounds
    /// check.
    ///
    /// # Safety
    /// `offset + len` must not exceed [`AlignedBuffer::len`].
    #[inline(always)]
    pub unsafe fn window_unchecked(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(
            offset + len <= self.layout.size(),
            "window {}+{} past {} byte buffer",
            offset,
            len,
            self.layout.size()
        );
        std::slice::from_raw_parts(self.ptr.as_ptr().add(offset), len)
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `for_lengths` with this exact layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
