//! Register bus abstraction
//!
//! The ADC driver never touches absolute addresses directly. It talks to a
//! [`RegisterIo`] implementation that resolves window-relative offsets, which
//! lets the same driver run on a real memory-mapped window ([`MmioWindow`])
//! and on a mock register file in host tests.

use crate::error::{AttachError, AttachResult};
use crate::internal::register::adc::ADC_WINDOW_MIN_LEN;
use crate::internal::register::{read_reg, write_reg};

// =============================================================================
// Register Bus Trait
// =============================================================================

/// Trait for 32-bit register window access
///
/// Implementations must be usable from interrupt context and from any
/// thread at the same time: every method takes `&self` and must neither
/// block nor allocate.
pub trait RegisterIo: Sync {
    /// Read the register at `offset` bytes from the window start
    fn read(&self, offset: usize) -> u32;

    /// Write the register at `offset` bytes from the window start
    fn write(&self, offset: usize, value: u32);

    /// Identity of the window (its base address), used to detect two
    /// devices mapping the same peripheral
    fn base_address(&self) -> usize;
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value);
    }

    #[inline]
    fn base_address(&self) -> usize {
        (**self).base_address()
    }
}

// =============================================================================
// MMIO Window
// =============================================================================

/// A memory-mapped ADC register window
///
/// Created by the integration layer once the physical region has been
/// mapped. The window is validated on construction; after that every access
/// is a plain volatile load or store.
#[derive(Debug)]
pub struct MmioWindow {
    base: usize,
    len: usize,
}

impl MmioWindow {
    /// Wrap a mapped register window.
    ///
    /// Fails with [`AttachError::InvalidMapping`] if `base` is null or not
    /// word aligned, or if `len` does not cover the ADC register block.
    ///
    /// # Safety
    ///
    /// `base..base + len` must be a live device mapping of the ADC block for
    /// as long as the returned window (and any device built on it) exists,
    /// and nothing else may drive these registers meanwhile.
    pub unsafe fn new(base: usize, len: usize) -> AttachResult<Self> {
        if base == 0 || base % 4 != 0 || len < ADC_WINDOW_MIN_LEN {
            return Err(AttachError::InvalidMapping);
        }
        Ok(Self { base, len })
    }

    /// Length of the mapped window in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window is empty (never true for a validated window)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl RegisterIo for MmioWindow {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len);
        // SAFETY: the window was validated in `new` and the caller of `new`
        // guaranteed the mapping stays live.
        unsafe { read_reg(self.base + offset) }
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.len);
        // SAFETY: see `read`.
        unsafe { write_reg(self.base + offset, value) }
    }

    #[inline(always)]
    fn base_address(&self) -> usize {
        self.base
    }
}
