//! ADC interrupt handling.
//!
//! The end-of-conversion interrupt does exactly two things: clear the
//! hardware request and wake everyone waiting on the device. It does not
//! read the sample and does not decide who gets it; readers re-check the
//! hardware flag themselves when they run.
//!
//! # Example
//!
//! ```ignore
//! static DEVICE: AdcDevice<MmioWindow> = /* attached at boot */;
//!
//! #[interrupt]
//! fn ADC() {
//!     DEVICE.interrupt_handler().handle();
//! }
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use crate::driver::regs::AdcRegisters;
use crate::hal::mmio::RegisterIo;
use crate::sync::notifier::CompletionNotifier;

// =============================================================================
// Interrupt Line
// =============================================================================

/// Platform interrupt number the ADC is wired to.
///
/// Opaque to the driver; recorded at attach time so the integration layer
/// can route the line to [`IrqHandler::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine(u32);

impl IrqLine {
    /// Wrap a platform interrupt number
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Platform interrupt number
    pub const fn number(self) -> u32 {
        self.0
    }
}

/// Outcome reported back to the interrupt dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The interrupt was acknowledged
    Handled,
}

// =============================================================================
// Interrupt Handler
// =============================================================================

/// Interrupt-context view of an [`AdcDevice`](crate::AdcDevice).
///
/// Obtained from [`AdcDevice::interrupt_handler`](crate::AdcDevice::interrupt_handler).
/// Only [`handle`](Self::handle) is exposed: the handler has no access to
/// sessions or to the data register.
pub struct IrqHandler<'d, R: RegisterIo, const W: usize> {
    regs: &'d AdcRegisters<R>,
    notifier: &'d CompletionNotifier<W>,
    count: &'d AtomicU32,
}

impl<R: RegisterIo, const W: usize> Clone for IrqHandler<'_, R, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: RegisterIo, const W: usize> Copy for IrqHandler<'_, R, W> {}

impl<'d, R: RegisterIo, const W: usize> IrqHandler<'d, R, W> {
    pub(crate) const fn new(
        regs: &'d AdcRegisters<R>,
        notifier: &'d CompletionNotifier<W>,
        count: &'d AtomicU32,
    ) -> Self {
        Self {
            regs,
            notifier,
            count,
        }
    }

    /// Service one ADC interrupt.
    ///
    /// Acknowledges the hardware, counts the interrupt and wakes all waiters.
    /// Never blocks, never allocates and does not look at the conversion
    /// state, so a spurious interrupt is handled the same way as a real one.
    #[inline]
    pub fn handle(&self) -> IrqReturn {
        self.regs.acknowledge_and_clear();
        self.count.fetch_add(1, Ordering::Relaxed);
        self.notifier.signal_all();
        IrqReturn::Handled
    }
}
