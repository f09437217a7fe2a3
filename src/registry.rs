//! Device registry: attach and detach ADC peripherals.
//!
//! The registry hands out minor numbers and makes sure no two devices drive
//! the same register window. It only keeps bookkeeping (one base address
//! per minor); the [`AdcDevice`] itself is returned to the caller, who
//! decides where it lives (a `static`, a `StaticCell`, the stack of a test).
//!
//! Detaching consumes the device. Since sessions borrow the device, the
//! borrow checker guarantees none is left open at that point. A device
//! dropped without being detached keeps its minor number and window
//! claimed: attaching the same window again fails with
//! [`AttachError::WindowBusy`] for the lifetime of the registry.
//!
//! ```ignore
//! static REGISTRY: DeviceRegistry = DeviceRegistry::new();
//!
//! let window = unsafe { MmioWindow::new(mapped_base, 0x1000)? };
//! let adc: AdcDevice<MmioWindow> =
//!     REGISTRY.attach(window, IrqLine::new(IRQ_ADC), &AdcConfig::default())?;
//! // ...
//! let window = REGISTRY.detach(adc)?;
//! ```

use crate::driver::config::AdcConfig;
use crate::driver::device::{AdcDevice, DeviceNumber};
use crate::driver::interrupt::IrqLine;
use crate::error::{AttachError, AttachResult};
use crate::hal::mmio::RegisterIo;
use crate::internal::constants::DEFAULT_REGISTRY_SLOTS;
use crate::internal::fmt::info;
use core::sync::atomic::{AtomicU32, Ordering};
use crate::sync::CriticalSectionCell;

/// Bookkeeping for attached ADC devices, with room for `N` of them.
pub struct DeviceRegistry<const N: usize = DEFAULT_REGISTRY_SLOTS> {
    /// Base address of the window attached under each minor number
    slots: CriticalSectionCell<[Option<usize>; N]>,
    /// Identity stamped on attached devices; 0 until the first attach
    id: AtomicU32,
}

/// Source of registry identities. 0 marks a device built outside a registry.
static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DeviceRegistry<N> {
    /// Create an empty registry (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            slots: CriticalSectionCell::new([None; N]),
            id: AtomicU32::new(0),
        }
    }

    fn id(&self) -> u32 {
        let current = self.id.load(Ordering::Acquire);
        if current != 0 {
            return current;
        }
        let fresh = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);
        match self
            .id
            .compare_exchange(0, fresh, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => fresh,
            Err(assigned) => assigned,
        }
    }

    /// Attach the ADC behind `io`.
    ///
    /// Validates `config`, claims the lowest free minor number, programs the
    /// peripheral and returns the ready device. Nothing is claimed when an
    /// error is returned. The claim lasts until the device is handed back to
    /// [`detach`](Self::detach); dropping the device does not release it.
    ///
    /// # Errors
    ///
    /// - [`AttachError::Config`]: `config` is invalid
    /// - [`AttachError::WindowBusy`]: a device on the same window is attached
    /// - [`AttachError::RegistryFull`]: all `N` slots are taken
    pub fn attach<R: RegisterIo, const W: usize>(
        &self,
        io: R,
        irq: IrqLine,
        config: &AdcConfig,
    ) -> AttachResult<AdcDevice<R, W>> {
        config.validate()?;

        let base = io.base_address();
        let minor = self.slots.with(|slots| {
            if slots.iter().flatten().any(|&owner| owner == base) {
                return Err(AttachError::WindowBusy);
            }
            let index = slots
                .iter()
                .position(Option::is_none)
                .filter(|&index| index <= u8::MAX as usize)
                .ok_or(AttachError::RegistryFull)?;
            slots[index] = Some(base);
            Ok(index as u8)
        })?;

        let device = AdcDevice::new(io, irq, DeviceNumber::new(minor)).with_registry(self.id());
        device.registers().configure(config);

        info!("{}: attached (irq {})", minor, irq.number());
        Ok(device)
    }

    /// Detach `device` and give its register window back.
    ///
    /// The device is taken offline first.
    ///
    /// # Errors
    ///
    /// [`AttachError::NotRegistered`] if `device` was not attached through
    /// this registry. The device is dropped in that case.
    pub fn detach<R: RegisterIo, const W: usize>(
        &self,
        device: AdcDevice<R, W>,
    ) -> AttachResult<R> {
        let minor = device.number().minor;
        let base = device.registers().io().base_address();
        if device.registry() != self.id() {
            return Err(AttachError::NotRegistered);
        }

        self.slots.with(|slots| match slots.get_mut(minor as usize) {
            Some(slot) if *slot == Some(base) => {
                *slot = None;
                Ok(())
            }
            _ => Err(AttachError::NotRegistered),
        })?;

        device.shutdown();
        info!("{}: detached after {} interrupts", minor, device.irq_count());
        Ok(device.into_io())
    }

    /// Number of attached devices
    pub fn attached(&self) -> usize {
        self.slots.with_ref(|slots| slots.iter().flatten().count())
    }

    /// Whether a device on the window at `base` is attached
    pub fn is_attached(&self, base: usize) -> bool {
        self.slots
            .with_ref(|slots| slots.iter().flatten().any(|&owner| owner == base))
    }

    /// Maximum number of devices
    pub const fn capacity(&self) -> usize {
        N
    }
}
