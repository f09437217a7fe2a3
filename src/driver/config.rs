//! Configuration types for the S3C ADC driver

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::{DEFAULT_PRESCALER, MAX_CHANNEL};
use crate::internal::register::adc::{ADCDAT0_MASK_10BIT, ADCDAT0_MASK_12BIT};

/// Conversion resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 10-bit samples (0..=1023)
    Bits10,
    /// 12-bit samples (0..=4095)
    #[default]
    Bits12,
}

impl Resolution {
    /// Parse a bit count as used by the set-resolution control request
    pub const fn from_bits(bits: u32) -> ConfigResult<Self> {
        match bits {
            10 => Ok(Resolution::Bits10),
            12 => Ok(Resolution::Bits12),
            _ => Err(ConfigError::InvalidResolution),
        }
    }

    /// Number of significant bits in a sample
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits10 => 10,
            Resolution::Bits12 => 12,
        }
    }

    /// Mask applied to ADCDAT0
    #[must_use]
    pub const fn data_mask(self) -> u32 {
        match self {
            Resolution::Bits10 => ADCDAT0_MASK_10BIT,
            Resolution::Bits12 => ADCDAT0_MASK_12BIT,
        }
    }
}

/// Analog input selected through ADCMUX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// AIN0, the input the board wires to the potentiometer
    pub const AIN0: Channel = Channel(0);

    /// Create a channel, validating it against AIN0..=AIN9
    pub const fn new(index: u8) -> ConfigResult<Self> {
        if index > MAX_CHANNEL {
            Err(ConfigError::InvalidChannel)
        } else {
            Ok(Channel(index))
        }
    }

    /// Channel number as written to ADCMUX
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Complete ADC configuration
///
/// The defaults reproduce the classic bring-up sequence: start-by-read,
/// normal (non-standby) operation, prescaler 255 enabled, 12-bit, AIN0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Reading ADCDAT0 starts the next conversion
    pub start_by_read: bool,
    /// Put the converter in standby
    pub standby: bool,
    /// Prescaler value (ADC clock = PCLK / (prescaler + 1))
    pub prescaler: u8,
    /// Enable the prescaler
    pub prescaler_enable: bool,
    /// Conversion resolution
    pub resolution: Resolution,
    /// Analog input channel
    pub channel: Channel,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_by_read: true,
            standby: false,
            prescaler: DEFAULT_PRESCALER,
            prescaler_enable: true,
            resolution: Resolution::Bits12,
            channel: Channel::AIN0,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Enable or disable start-by-read
    #[must_use]
    pub const fn with_start_by_read(mut self, enabled: bool) -> Self {
        self.start_by_read = enabled;
        self
    }

    /// Enable or disable standby mode
    #[must_use]
    pub const fn with_standby(mut self, standby: bool) -> Self {
        self.standby = standby;
        self
    }

    /// Set the prescaler value and enable the prescaler
    #[must_use]
    pub const fn with_prescaler(mut self, prescaler: u8) -> Self {
        self.prescaler = prescaler;
        self.prescaler_enable = true;
        self
    }

    /// Enable or disable the prescaler without changing its value
    #[must_use]
    pub const fn with_prescaler_enable(mut self, enabled: bool) -> Self {
        self.prescaler_enable = enabled;
        self
    }

    /// Set the conversion resolution
    #[must_use]
    pub const fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the analog input channel
    #[must_use]
    pub const fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Check the configuration for values the hardware cannot hold.
    ///
    /// Fields built through [`Channel::new`] are always valid; this catches
    /// configurations assembled by hand.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.channel.0 > MAX_CHANNEL {
            return Err(ConfigError::InvalidChannel);
        }
        Ok(())
    }
}
