//! Memory-mapped register definitions for the S3C/S5P ADC
//!
//! This module provides the raw volatile accessors used by
//! [`MmioWindow`](crate::hal::mmio::MmioWindow) and the register map of the
//! ADC block. All register access is volatile to ensure proper hardware
//! interaction.

pub mod adc;

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Compute the new value of a field-masked register.
///
/// Bits outside `mask` are kept from `current`, bits inside are taken from
/// `value` (already shifted into position).
#[inline(always)]
pub const fn with_field(current: u32, mask: u32, value: u32) -> u32 {
    (current & !mask) | (value & mask)
}
