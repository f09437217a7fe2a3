//! ioctl-style control requests.

use crate::driver::config::Resolution;
use crate::error::{Error, Result};
use crate::internal::constants::IOCTL_SET_RESOLUTION;

/// Decoded control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRequest {
    /// Select the conversion resolution
    SetResolution(Resolution),
}

impl ControlRequest {
    /// Decode a raw `(cmd, arg)` pair.
    ///
    /// Unknown commands and out-of-range arguments are rejected with
    /// [`Error::InvalidRequest`].
    pub fn decode(cmd: u32, arg: usize) -> Result<Self> {
        match cmd {
            IOCTL_SET_RESOLUTION => {
                let bits = u32::try_from(arg).map_err(|_| Error::InvalidRequest)?;
                Ok(ControlRequest::SetResolution(Resolution::from_bits(bits)?))
            }
            _ => Err(Error::InvalidRequest),
        }
    }

    /// Raw command number of this request
    pub const fn command(&self) -> u32 {
        match self {
            ControlRequest::SetResolution(_) => IOCTL_SET_RESOLUTION,
        }
    }
}
