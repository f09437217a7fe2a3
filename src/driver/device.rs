//! ADC device instance.
//!
//! One [`AdcDevice`] exists per attached peripheral. It owns the register
//! window and the completion notifier, hands out [`Session`]s to readers and
//! an [`IrqHandler`] to the interrupt dispatcher.
//!
//! All methods take `&self`, so a device can live in a `static` shared by
//! threads and the interrupt handler.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::driver::config::{AdcConfig, Channel, Resolution};
use crate::driver::interrupt::{IrqHandler, IrqLine};
use crate::driver::regs::{AdcRegisters, ConversionState};
use crate::driver::session::{OpenFlags, Session};
use crate::error::{ConfigResult, Error, Result};
use crate::hal::mmio::RegisterIo;
use crate::internal::constants::{DEFAULT_WAITERS, DEVICE_NAME};
use crate::internal::fmt::{debug, info};
use crate::sync::notifier::CompletionNotifier;

// =============================================================================
// Device Number
// =============================================================================

/// Identity assigned to a device when it is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceNumber {
    /// Minor number, unique among attached devices
    pub minor: u8,
}

impl DeviceNumber {
    /// Create a device number
    pub const fn new(minor: u8) -> Self {
        Self { minor }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DEVICE_NAME, self.minor)
    }
}

// =============================================================================
// ADC Device
// =============================================================================

/// An attached ADC peripheral.
///
/// `R` is the register window, `W` the number of waiters the completion
/// notifier can hold at once.
pub struct AdcDevice<R: RegisterIo, const W: usize = DEFAULT_WAITERS> {
    regs: AdcRegisters<R>,
    notifier: CompletionNotifier<W>,
    irq: IrqLine,
    number: DeviceNumber,
    open_count: AtomicUsize,
    online: AtomicBool,
    irq_count: AtomicU32,
    /// Identity of the registry that attached this device, 0 if none
    registry: u32,
}

impl<R: RegisterIo, const W: usize> AdcDevice<R, W> {
    /// Build a device around a register window without touching hardware.
    ///
    /// Call [`configure`](Self::configure) before serving reads, or use
    /// [`DeviceRegistry::attach`](crate::DeviceRegistry::attach), which does
    /// both.
    pub const fn new(io: R, irq: IrqLine, number: DeviceNumber) -> Self {
        Self {
            regs: AdcRegisters::new(io),
            notifier: CompletionNotifier::new(),
            irq,
            number,
            open_count: AtomicUsize::new(0),
            online: AtomicBool::new(true),
            irq_count: AtomicU32::new(0),
            registry: 0,
        }
    }

    pub(crate) fn with_registry(mut self, registry: u32) -> Self {
        self.registry = registry;
        self
    }

    pub(crate) fn registry(&self) -> u32 {
        self.registry
    }

    /// Validate `config` and program it into the peripheral.
    ///
    /// Starts the first conversion in start-by-read mode.
    pub fn configure(&self, config: &AdcConfig) -> ConfigResult<()> {
        config.validate()?;
        self.regs.configure(config);
        Ok(())
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Open a session.
    ///
    /// # Errors
    ///
    /// [`Error::Unavailable`] once the device has been shut down.
    pub fn open(&self, flags: OpenFlags) -> Result<Session<'_, R, W>> {
        if !self.is_online() {
            return Err(Error::Unavailable);
        }
        let open = self.open_count.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("{}: open (nonblocking={}, sessions={})", self.number.minor, flags.is_nonblocking(), open);
        Ok(Session::new(self, flags))
    }

    /// Number of sessions currently open
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Acquire)
    }

    pub(crate) fn release_session(&self) {
        let remaining = self.open_count.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        debug!("{}: release (sessions={})", self.number.minor, remaining);
    }

    /// Take the device offline.
    ///
    /// New opens fail with [`Error::Unavailable`]; every blocked read
    /// returns [`Error::Interrupted`] and every watcher sees
    /// [`ReadinessMask::HANGUP`](crate::ReadinessMask::HANGUP).
    pub fn shutdown(&self) {
        if self.online.swap(false, Ordering::AcqRel) {
            let woken = self.notifier.signal_all();
            info!("{}: shut down, {} waiters released", self.number.minor, woken);
        }
    }

    /// Whether the device still serves sessions
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    // =========================================================================
    // Interrupts
    // =========================================================================

    /// Interrupt-context handle to wire to [`irq_line`](Self::irq_line)
    pub fn interrupt_handler(&self) -> IrqHandler<'_, R, W> {
        IrqHandler::new(&self.regs, &self.notifier, &self.irq_count)
    }

    /// Number of interrupts handled so far
    pub fn irq_count(&self) -> u32 {
        self.irq_count.load(Ordering::Relaxed)
    }

    /// Interrupt line recorded at attach time
    pub fn irq_line(&self) -> IrqLine {
        self.irq
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Device number assigned at attach time
    pub fn number(&self) -> DeviceNumber {
        self.number
    }

    /// Name the device is published under
    pub fn name(&self) -> &'static str {
        DEVICE_NAME
    }

    /// Readiness view over the conversion status bit
    pub fn conversion_state(&self) -> ConversionState<'_, R> {
        ConversionState::new(&self.regs)
    }

    /// Currently selected resolution
    pub fn resolution(&self) -> Resolution {
        self.regs.resolution()
    }

    /// Currently selected analog input
    pub fn channel(&self) -> Channel {
        self.regs.channel()
    }

    /// Number of readers and watchers currently registered for a wakeup
    pub fn waiters(&self) -> usize {
        self.notifier.waiters()
    }

    /// Register interface of this device
    pub fn registers(&self) -> &AdcRegisters<R> {
        &self.regs
    }

    pub(crate) fn notifier(&self) -> &CompletionNotifier<W> {
        &self.notifier
    }

    pub(crate) fn online_flag(&self) -> &AtomicBool {
        &self.online
    }

    pub(crate) fn into_io(self) -> R {
        self.regs.into_inner()
    }
}

impl<R: RegisterIo, const W: usize> fmt::Debug for AdcDevice<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdcDevice")
            .field("number", &self.number)
            .field("irq", &self.irq)
            .field("base", &self.regs.io().base_address())
            .field("online", &self.is_online())
            .field("open_count", &self.open_count())
            .field("irq_count", &self.irq_count())
            .finish_non_exhaustive()
    }
}
