//! Typed access to the ADC register block.
//!
//! [`AdcRegisters`] is the only code that knows the ADCCON/ADCDAT0/ADCCLRINT/
//! ADCMUX layout. [`ConversionState`] is the single authoritative readiness
//! check shared by the read and poll paths.

use crate::driver::config::{AdcConfig, Channel, Resolution};
use crate::hal::mmio::RegisterIo;
use crate::internal::fmt::debug;
use crate::internal::register::adc::{
    ADCCLRINT_CLEAR, ADCCLRINT_OFFSET, ADCCON_ECFLG, ADCCON_ENABLE_START, ADCCON_OFFSET, ADCCON_PRSCEN,
    ADCCON_PRSCVL_MASK, ADCCON_PRSCVL_SHIFT, ADCCON_READ_START, ADCCON_RES_SEL, ADCCON_STDBM,
    ADCDAT0_OFFSET, ADCMUX_OFFSET, ADCMUX_SEL_MASK,
};
use crate::internal::register::with_field;

/// Register interface of one ADC peripheral.
///
/// Owns the register window for the lifetime of the device. All methods take
/// `&self`: `read_raw`, `is_finished` and `acknowledge_and_clear` are single
/// volatile accesses and safe to race, while the control-register writers
/// serialize themselves with a critical section.
#[derive(Debug)]
pub struct AdcRegisters<R: RegisterIo> {
    io: R,
}

impl<R: RegisterIo> AdcRegisters<R> {
    /// Wrap a register window without touching the hardware
    pub const fn new(io: R) -> Self {
        Self { io }
    }

    /// Write the control and mux registers from `config`, then start the
    /// first conversion with a dummy data read.
    pub fn configure(&self, config: &AdcConfig) {
        critical_section::with(|_| {
            let mut con = self.io.read(ADCCON_OFFSET);

            con = if config.start_by_read {
                con | ADCCON_READ_START
            } else {
                con & !ADCCON_READ_START
            };
            con = if config.standby {
                con | ADCCON_STDBM
            } else {
                con & !ADCCON_STDBM
            };
            con = with_field(
                con,
                ADCCON_PRSCVL_MASK,
                (config.prescaler as u32) << ADCCON_PRSCVL_SHIFT,
            );
            con = if config.prescaler_enable {
                con | ADCCON_PRSCEN
            } else {
                con & !ADCCON_PRSCEN
            };
            con = Self::with_resolution(con, config.resolution);

            self.io.write(ADCCON_OFFSET, con);

            let mux = self.io.read(ADCMUX_OFFSET);
            self.io.write(
                ADCMUX_OFFSET,
                with_field(mux, ADCMUX_SEL_MASK, config.channel.index() as u32),
            );
        });

        if config.start_by_read {
            // Dummy read kicks off the first conversion.
            let _ = self.io.read(ADCDAT0_OFFSET);
        } else {
            self.start_conversion();
        }

        debug!(
            "adc configured: prescaler={} resolution={} channel={}",
            config.prescaler,
            config.resolution.bits(),
            config.channel.index()
        );
    }

    /// Latest conversion result, masked to the configured width.
    ///
    /// With start-by-read enabled this also starts the next conversion.
    #[inline]
    pub fn read_raw(&self) -> u16 {
        let mask = self.resolution().data_mask();
        (self.io.read(ADCDAT0_OFFSET) & mask) as u16
    }

    /// Start one conversion through ADCCON.ENABLE_START (cleared by hardware)
    pub fn start_conversion(&self) {
        critical_section::with(|_| {
            let con = self.io.read(ADCCON_OFFSET);
            self.io.write(ADCCON_OFFSET, con | ADCCON_ENABLE_START);
        });
    }

    /// Whether reading ADCDAT0 starts the next conversion
    #[inline]
    pub fn start_by_read(&self) -> bool {
        self.io.read(ADCCON_OFFSET) & ADCCON_READ_START != 0
    }

    /// Whether the current conversion has finished (ADCCON.ECFLG set)
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.io.read(ADCCON_OFFSET) & ADCCON_ECFLG != 0
    }

    /// Clear the pending ADC interrupt. Safe to call more than once.
    #[inline]
    pub fn acknowledge_and_clear(&self) {
        self.io.write(ADCCLRINT_OFFSET, ADCCLRINT_CLEAR);
    }

    /// Change the conversion resolution (read-modify-write of ADCCON)
    pub fn set_resolution(&self, resolution: Resolution) {
        critical_section::with(|_| {
            let con = self.io.read(ADCCON_OFFSET);
            self.io.write(ADCCON_OFFSET, Self::with_resolution(con, resolution));
        });
        debug!("adc resolution set to {} bits", resolution.bits());
    }

    /// Resolution currently selected in ADCCON
    #[inline]
    pub fn resolution(&self) -> Resolution {
        if self.io.read(ADCCON_OFFSET) & ADCCON_RES_SEL != 0 {
            Resolution::Bits12
        } else {
            Resolution::Bits10
        }
    }

    /// Analog input currently selected in ADCMUX
    pub fn channel(&self) -> Channel {
        let index = (self.io.read(ADCMUX_OFFSET) & ADCMUX_SEL_MASK) as u8;
        // Out-of-range mux values are reported as AIN0.
        Channel::new(index).unwrap_or(Channel::AIN0)
    }

    /// Access the underlying register window
    pub fn io(&self) -> &R {
        &self.io
    }

    /// Give the register window back (used on detach)
    pub fn into_inner(self) -> R {
        self.io
    }

    fn with_resolution(con: u32, resolution: Resolution) -> u32 {
        match resolution {
            Resolution::Bits12 => con | ADCCON_RES_SEL,
            Resolution::Bits10 => con & !ADCCON_RES_SEL,
        }
    }
}

/// Readiness derived from the hardware status bit.
///
/// Holds no state of its own: every call goes back to ADCCON.
#[derive(Debug)]
pub struct ConversionState<'a, R: RegisterIo> {
    regs: &'a AdcRegisters<R>,
}

impl<R: RegisterIo> Clone for ConversionState<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: RegisterIo> Copy for ConversionState<'_, R> {}

impl<'a, R: RegisterIo> ConversionState<'a, R> {
    /// Bind to a register interface
    pub const fn new(regs: &'a AdcRegisters<R>) -> Self {
        Self { regs }
    }

    /// Whether a finished conversion is available right now
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.regs.is_finished()
    }
}
