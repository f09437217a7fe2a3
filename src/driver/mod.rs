//! Core driver components for the S3C ADC peripheral.
//!
//! - [`config`] - Configuration types and builder
//! - [`regs`] - Register interface and conversion state
//! - [`interrupt`] - Interrupt handler
//! - [`device`] - The attached device instance
//! - [`session`] - Reader sessions and the read path
//! - [`readiness`] - Readiness masks and multiplexed waits
//! - [`control`] - ioctl-style control requests
//!
//! # Example
//!
//! ```ignore
//! use ph_s3c_adc::driver::{AdcConfig, AdcDevice, OpenFlags};
//!
//! let session = adc.open(OpenFlags::BLOCKING)?;
//! let mut buf = [0u8; 4];
//! session.read_with(&mut buf, &mut SpinPark)?;
//! let millivolts = u32::from_ne_bytes(buf) * 3300 / 4095;
//! ```

pub mod config;
pub mod control;
pub mod device;
pub mod interrupt;
pub mod readiness;
pub mod regs;
pub mod session;

pub use config::{AdcConfig, Channel, Resolution};
pub use control::ControlRequest;
pub use device::{AdcDevice, DeviceNumber};
pub use interrupt::{IrqHandler, IrqLine, IrqReturn};
pub use readiness::{PollMany, Pollable, ReadinessMask, poll_many, poll_now};
pub use regs::{AdcRegisters, ConversionState};
pub use session::{OpenFlags, Sample, Session};
