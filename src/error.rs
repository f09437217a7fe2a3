//! Error types for the S3C ADC driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`Error`]: session operations (read, poll, control requests)
//! - [`ConfigError`]: invalid configuration values
//! - [`AttachError`]: attaching or detaching a device through the registry
//!
//! Every error maps to the Linux errno an OS integration layer would report,
//! see the `errno()` methods.

// =============================================================================
// errno values
// =============================================================================

/// Linux errno values reported by [`Error::errno`] and friends.
pub mod errno {
    /// No such file or directory
    pub const ENOENT: i32 = 2;
    /// Interrupted system call
    pub const EINTR: i32 = 4;
    /// Try again
    pub const EAGAIN: i32 = 11;
    /// Out of memory
    pub const ENOMEM: i32 = 12;
    /// Bad address
    pub const EFAULT: i32 = 14;
    /// Device or resource busy
    pub const EBUSY: i32 = 16;
    /// No such device
    pub const ENODEV: i32 = 19;
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// No space left on device
    pub const ENOSPC: i32 = 28;
    /// Connection timed out
    pub const ETIMEDOUT: i32 = 110;
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors returned by session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Non-blocking read while no conversion has finished
    WouldBlock,
    /// Blocking wait cancelled before a conversion finished
    Interrupted,
    /// The sample could not be delivered into the caller's buffer
    FaultyBuffer,
    /// Unrecognized or malformed control request
    InvalidRequest,
    /// The device is offline and does not serve sessions
    Unavailable,
    /// The park strategy gave up waiting
    TimedOut,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::WouldBlock => "conversion not finished",
            Error::Interrupted => "wait interrupted",
            Error::FaultyBuffer => "sample could not be delivered",
            Error::InvalidRequest => "invalid control request",
            Error::Unavailable => "device unavailable",
            Error::TimedOut => "wait timed out",
        }
    }

    /// Positive Linux errno for this error
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            Error::WouldBlock => errno::EAGAIN,
            Error::Interrupted => errno::EINTR,
            Error::FaultyBuffer => errno::EFAULT,
            Error::InvalidRequest => errno::EINVAL,
            Error::Unavailable => errno::ENODEV,
            Error::TimedOut => errno::ETIMEDOUT,
        }
    }

    /// Whether retrying the same operation later can succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Error::WouldBlock | Error::Interrupted | Error::TimedOut)
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// These errors occur when an [`AdcConfig`](crate::AdcConfig) or a control
/// request carries values the hardware cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Analog input outside AIN0..=AIN9
    InvalidChannel,
    /// Resolution other than 10 or 12 bits
    InvalidResolution,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidChannel => "invalid analog input channel",
            ConfigError::InvalidResolution => "unsupported resolution",
        }
    }

    /// Positive Linux errno for this error
    #[must_use]
    pub const fn errno(&self) -> i32 {
        errno::EINVAL
    }
}

impl From<ConfigError> for Error {
    fn from(_: ConfigError) -> Self {
        Error::InvalidRequest
    }
}

// =============================================================================
// Attach Errors
// =============================================================================

/// Errors raised while attaching or detaching a device.
///
/// These are fatal to device availability: a device that failed to attach
/// never serves sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachError {
    /// Register window is null, misaligned or too small
    InvalidMapping,
    /// Another attached device already owns this register window
    WindowBusy,
    /// No free registry slot
    RegistryFull,
    /// The device is not attached to this registry
    NotRegistered,
    /// Initial configuration rejected
    Config(ConfigError),
}

impl core::fmt::Display for AttachError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AttachError::Config(e) => write!(f, "config: {}", e.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl AttachError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AttachError::InvalidMapping => "invalid register mapping",
            AttachError::WindowBusy => "register window already attached",
            AttachError::RegistryFull => "device registry full",
            AttachError::NotRegistered => "device not registered",
            AttachError::Config(_) => "invalid configuration",
        }
    }

    /// Positive Linux errno for this error
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            AttachError::InvalidMapping => errno::ENOMEM,
            AttachError::WindowBusy => errno::EBUSY,
            AttachError::RegistryFull => errno::ENOSPC,
            AttachError::NotRegistered => errno::ENOENT,
            AttachError::Config(e) => e.errno(),
        }
    }
}

impl From<ConfigError> for AttachError {
    fn from(e: ConfigError) -> Self {
        AttachError::Config(e)
    }
}

/// Result type alias for session operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for attach/detach operations
pub type AttachResult<T> = core::result::Result<T, AttachError>;

// =============================================================================
// Unit Tests
// =============================================================================
