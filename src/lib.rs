//! S3C ADC Driver
//!
//! A `no_std`, `no_alloc` Rust driver for the on-chip analog-to-digital
//! converter of Samsung S3C/S5P SoCs (the TSADC block, as found on the
//! S5PV210), exposing conversions to readers as a character-device style
//! API: blocking reads, non-blocking reads and `poll(2)`-style readiness.
//!
//! # Architecture
//!
//! 1. **Driver Layer** ([`driver`]): device instances, sessions, the
//!    interrupt handler and the register interface
//! 2. **Sync Layer** ([`sync`]): the completion notifier the interrupt
//!    signals and readers wait on, plus park strategies for bare metal
//! 3. **HAL Layer** ([`hal`]): the register bus trait and the MMIO window
//! 4. **Registry** ([`registry`]): attach/detach and minor numbers
//!
//! ## Synchronization model
//!
//! The hardware status bit (ADCCON.ECFLG) is the only source of truth for
//! "a sample is ready". The interrupt handler acknowledges the hardware and
//! wakes every waiter; it never reads the sample and never records state.
//! Readers and pollers re-read the status bit right after registering for a
//! wakeup and again after every wake, so an interrupt arriving between a
//! reader's check and its sleep is never lost.
//!
//! # Features
//!
//! - `defmt`: `defmt::Format` for public types and defmt logging
//! - `log`: logging through the `log` facade
//! - `std`: thread-blocking [`Session::read`] and the host critical-section
//!   implementation
//!
//! # Example
//!
//! ```ignore
//! use ph_s3c_adc::{AdcConfig, AdcDevice, DeviceRegistry, IrqLine, MmioWindow, OpenFlags};
//! use ph_s3c_adc::sync::SpinPark;
//!
//! static REGISTRY: DeviceRegistry = DeviceRegistry::new();
//! static ADC: StaticCell<AdcDevice<MmioWindow>> = StaticCell::new();
//!
//! let window = unsafe { MmioWindow::new(ADC_VIRT_BASE, 0x1000)? };
//! let adc = ADC.init(REGISTRY.attach(window, IrqLine::new(IRQ_ADC), &AdcConfig::default())?);
//!
//! // interrupt dispatcher
//! fn on_adc_irq() {
//!     adc.interrupt_handler().handle();
//! }
//!
//! let session = adc.open(OpenFlags::BLOCKING)?;
//! let mut buf = [0u8; 4];
//! session.read_with(&mut buf, &mut SpinPark)?;
//! let raw = u32::from_ne_bytes(buf);
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; the same set is mirrored in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod error;
pub mod hal;
pub mod registry;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{AdcConfig, Channel, Resolution};
pub use driver::control::ControlRequest;
pub use driver::device::{AdcDevice, DeviceNumber};
pub use driver::interrupt::{IrqHandler, IrqLine, IrqReturn};
pub use driver::readiness::{Pollable, ReadinessMask, poll_many, poll_now};
pub use driver::session::{OpenFlags, Sample, Session};
pub use error::{AttachError, AttachResult, ConfigError, ConfigResult, Error, Result};
pub use hal::mmio::{MmioWindow, RegisterIo};
pub use registry::DeviceRegistry;

/// Low-level register definitions for advanced use.
///
/// Most users should go through [`AdcDevice`] and [`Session`]; writing these
/// registers directly bypasses the driver's synchronization.
pub mod unsafe_registers {
    pub use crate::driver::regs::AdcRegisters;
    pub use crate::internal::register::adc::{
        ADC_WINDOW_MIN_LEN, ADCCLRINT_OFFSET, ADCCON_ECFLG, ADCCON_ENABLE_START, ADCCON_OFFSET,
        ADCCON_PRSCEN, ADCCON_PRSCVL_MASK, ADCCON_READ_START, ADCCON_RES_SEL, ADCCON_STDBM,
        ADCDAT0_OFFSET, ADCMUX_OFFSET,
    };
}

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        // Configuration defaults
        DEFAULT_PRESCALER,
        // Capacities
        DEFAULT_REGISTRY_SLOTS,
        DEFAULT_WAITERS,
        // Timing
        DEFAULT_PARK_INTERVAL_US,
        DEVICE_NAME,
        // Control requests
        IOCTL_SET_RESOLUTION,
        MAX_CHANNEL,
        S5PV210_ADC_BASE,
        SAMPLE_BYTES,
    };
}
