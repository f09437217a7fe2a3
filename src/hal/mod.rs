//! Hardware Abstraction Layer
//!
//! This module provides the seam between the driver and the register
//! window, so the ADC logic works against real memory-mapped hardware and
//! against mock register files alike.
//!
//! # Modules
//!
//! - [`mmio`]: Register bus trait and the memory-mapped window implementation
//!
//! # Delay Integration
//!
//! Types that wait use `embedded_hal::delay::DelayNs` directly (see
//! [`DelayPark`](crate::sync::park::DelayPark)). Pass any delay
//! implementation from your HAL.

pub mod mmio;

// Re-export commonly used types
pub use mmio::{MmioWindow, RegisterIo};
