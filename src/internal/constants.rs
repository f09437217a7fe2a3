//! Centralized Constants
//!
//! Single source of truth for the magic numbers used throughout the ADC
//! driver.
//!
//! # Organization
//!
//! - **Defaults**: power-on configuration written at attach time
//! - **Sessions**: sample delivery and waiter capacity
//! - **Control**: ioctl-style request encoding
//! - **Timing**: park strategy intervals
//!
//! Hardware register bit definitions remain in `register/adc.rs`.

// =============================================================================
// Default Configuration
// =============================================================================

/// Default prescaler value (ADC clock = PCLK / (prescaler + 1))
pub const DEFAULT_PRESCALER: u8 = 0xFF;

/// Highest analog input selectable through ADCMUX
pub const MAX_CHANNEL: u8 = 9;

/// Name under which the registry publishes ADC devices
pub const DEVICE_NAME: &str = "adc";

/// Physical base of the TSADC block on the S5PV210
pub const S5PV210_ADC_BASE: usize = 0xE170_0000;

// =============================================================================
// Sessions
// =============================================================================

/// Number of bytes delivered per sample (native-endian `u32`)
pub const SAMPLE_BYTES: usize = 4;

/// Default capacity of the completion notifier's waiter queue
pub const DEFAULT_WAITERS: usize = 8;

/// Default capacity of a [`DeviceRegistry`](crate::DeviceRegistry)
pub const DEFAULT_REGISTRY_SLOTS: usize = 4;

// =============================================================================
// Control Requests
// =============================================================================

/// ioctl type ("magic") byte used by this driver
pub const ADC_IOC_MAGIC: u8 = b'A';

/// ioctl number of the set-resolution request
pub const ADC_IOC_NR_SET_RESOLUTION: u8 = 0;

/// Linux `_IOC_WRITE` direction bit
const IOC_WRITE: u32 = 1;

/// Encode a Linux `_IOW(type, nr, size)` request number.
pub const fn ioc_write(ty: u8, nr: u8, size: usize) -> u32 {
    (IOC_WRITE << 30) | ((size as u32 & 0x3FFF) << 16) | ((ty as u32) << 8) | nr as u32
}

/// `_IOW('A', 0, int)`: select the conversion resolution in bits
pub const IOCTL_SET_RESOLUTION: u32 =
    ioc_write(ADC_IOC_MAGIC, ADC_IOC_NR_SET_RESOLUTION, core::mem::size_of::<i32>());

// =============================================================================
// Timing
// =============================================================================

/// Default back-off between readiness checks for [`DelayPark`](crate::sync::park::DelayPark)
pub const DEFAULT_PARK_INTERVAL_US: u32 = 10;
