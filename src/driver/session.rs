//! Reader sessions.
//!
//! A [`Session`] is one open handle on an [`AdcDevice`]. It carries no
//! conversion context of its own: every session observes the same
//! conversion stream, and two sessions reading at the same time may get the
//! same sample or consecutive ones depending on timing.
//!
//! # Read paths
//!
//! | Entry point | Waits with |
//! |---|---|
//! | [`Session::read_async`] | the caller's executor |
//! | [`Session::read_with`] | a [`Park`] strategy (bare metal) |
//! | [`Session::read`] | thread parking (`std` feature) |
//!
//! All three share one implementation: blocking sessions wait on the
//! device's completion notifier until the hardware reports a finished
//! conversion; non-blocking sessions check once and fail with
//! [`Error::WouldBlock`].

use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Context;

use crate::driver::config::Resolution;
use crate::driver::control::ControlRequest;
use crate::driver::device::AdcDevice;
use crate::driver::readiness::{Pollable, ReadinessMask};
use crate::error::{Error, Result};
use crate::hal::mmio::RegisterIo;
use crate::internal::constants::{DEFAULT_WAITERS, SAMPLE_BYTES};
use crate::internal::fmt::{debug, trace};
use crate::sync::CriticalSectionCell;
use crate::sync::notifier::{CancelFlag, Cancellation, WaitKey};
use crate::sync::park::{Park, block_on_with};

// =============================================================================
// Open Flags
// =============================================================================

/// Flags a session is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpenFlags {
    nonblocking: bool,
}

impl OpenFlags {
    /// Linux `O_NONBLOCK`
    pub const O_NONBLOCK: u32 = 0o4000;

    /// Reads wait for a finished conversion
    pub const BLOCKING: Self = Self { nonblocking: false };

    /// Reads fail with [`Error::WouldBlock`] instead of waiting
    pub const NONBLOCKING: Self = Self { nonblocking: true };

    /// Decode raw `open(2)` flags; only `O_NONBLOCK` is significant
    pub const fn from_raw(flags: u32) -> Self {
        Self {
            nonblocking: flags & Self::O_NONBLOCK != 0,
        }
    }

    /// Set or clear non-blocking mode
    #[must_use]
    pub const fn with_nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }

    /// Whether reads are non-blocking
    pub const fn is_nonblocking(self) -> bool {
        self.nonblocking
    }
}

// =============================================================================
// Sample
// =============================================================================

/// One conversion result, already masked to the active resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample(u16);

impl Sample {
    /// Wrap a raw conversion value
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Conversion value
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Wire form handed to readers: a native-endian `u32`
    pub const fn to_ne_bytes(self) -> [u8; SAMPLE_BYTES] {
        (self.0 as u32).to_ne_bytes()
    }

    /// Copy the wire form into the front of `buf`.
    ///
    /// Returns the number of bytes written, or [`Error::FaultyBuffer`] if
    /// `buf` cannot hold a whole sample. Nothing is written on failure.
    pub fn write_to(self, buf: &mut [u8]) -> Result<usize> {
        let dst = buf.get_mut(..SAMPLE_BYTES).ok_or(Error::FaultyBuffer)?;
        dst.copy_from_slice(&self.to_ne_bytes());
        Ok(SAMPLE_BYTES)
    }
}

impl From<Sample> for u16 {
    fn from(sample: Sample) -> Self {
        sample.0
    }
}

// =============================================================================
// Session
// =============================================================================

/// Open handle on an [`AdcDevice`].
///
/// Obtained from [`AdcDevice::open`]; closing (or dropping) it has no
/// effect on the hardware. All methods take `&self`, so another thread can
/// [`interrupt`](Self::interrupt) a session blocked in a read.
pub struct Session<'d, R: RegisterIo, const W: usize = DEFAULT_WAITERS> {
    device: &'d AdcDevice<R, W>,
    nonblocking: AtomicBool,
    pending_interrupt: CancelFlag,
    /// Watcher registered by [`Session::poll`]
    watch: CriticalSectionCell<Option<WaitKey>>,
}

/// Cancellation of a blocking read: an interruption pending on the session,
/// or the device going offline.
struct Interruption<'a> {
    pending: &'a CancelFlag,
    online: &'a AtomicBool,
}

impl Cancellation for Interruption<'_> {
    fn take(&self) -> bool {
        !self.online.load(Ordering::Acquire) || self.pending.take()
    }
}

impl<'d, R: RegisterIo, const W: usize> Session<'d, R, W> {
    pub(crate) fn new(device: &'d AdcDevice<R, W>, flags: OpenFlags) -> Self {
        Self {
            device,
            nonblocking: AtomicBool::new(flags.is_nonblocking()),
            pending_interrupt: CancelFlag::new(),
            watch: CriticalSectionCell::new(None),
        }
    }

    /// Device this session was opened on
    pub fn device(&self) -> &'d AdcDevice<R, W> {
        self.device
    }

    /// Whether reads are non-blocking
    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking.load(Ordering::Relaxed)
    }

    /// Switch between blocking and non-blocking reads (`fcntl(F_SETFL)`)
    pub fn set_nonblocking(&self, nonblocking: bool) {
        self.nonblocking.store(nonblocking, Ordering::Relaxed);
    }

    /// Current flags of this session
    pub fn flags(&self) -> OpenFlags {
        OpenFlags::BLOCKING.with_nonblocking(self.is_nonblocking())
    }

    /// Interrupt a blocking read or multiplexed wait on this session.
    ///
    /// The wait in progress, or the next one if none is, returns
    /// [`Error::Interrupted`] without touching the hardware. Other sessions
    /// are woken as well and go back to sleep after re-checking.
    pub fn interrupt(&self) {
        self.pending_interrupt.cancel();
        self.device.notifier().signal_all();
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Wait for (or, in non-blocking mode, check for) a finished conversion
    /// and read it.
    ///
    /// # Errors
    ///
    /// - [`Error::WouldBlock`]: non-blocking and no conversion finished
    /// - [`Error::Interrupted`]: the wait was interrupted or the device shut
    ///   down while waiting
    /// - [`Error::Unavailable`]: the device is offline
    pub async fn read_sample(&self) -> Result<Sample> {
        let device = self.device;
        if !device.is_online() {
            return Err(Error::Unavailable);
        }

        let state = device.conversion_state();
        if self.is_nonblocking() {
            if !state.is_ready() {
                return Err(Error::WouldBlock);
            }
        } else {
            let interruption = Interruption {
                pending: &self.pending_interrupt,
                online: device.online_flag(),
            };
            device
                .notifier()
                .wait_until_ready(|| state.is_ready(), interruption)
                .await?;
        }

        let regs = device.registers();
        let sample = Sample::from_raw(regs.read_raw());
        if !regs.start_by_read() {
            regs.start_conversion();
        }
        trace!("{}: read {}", device.number().minor, sample.value());
        Ok(sample)
    }

    /// Read one sample into `buf` as a native-endian `u32`.
    ///
    /// The conversion is consumed before the copy, so a too-short buffer
    /// still starts the next conversion in start-by-read mode. Returns the
    /// number of bytes written.
    ///
    /// # Errors
    ///
    /// Those of [`read_sample`](Self::read_sample), plus
    /// [`Error::FaultyBuffer`] when `buf` is shorter than four bytes.
    pub async fn read_async(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_sample().await?.write_to(buf)
    }

    /// Blocking read on bare metal, parking through `park` while waiting.
    ///
    /// Returns [`Error::TimedOut`] if `park` gives up.
    pub fn read_with<P: Park + ?Sized>(&self, buf: &mut [u8], park: &mut P) -> Result<usize> {
        block_on_with(self.read_async(buf), park)?
    }

    /// Blocking read that parks the calling thread while waiting.
    #[cfg(feature = "std")]
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        futures::executor::block_on(self.read_async(buf))
    }

    // =========================================================================
    // Readiness Query Path
    // =========================================================================

    /// Report readiness and register for the next completion.
    ///
    /// Returns [`ReadinessMask::READABLE`] if a read would not block,
    /// [`ReadinessMask::HANGUP`] if the device went offline, and an empty
    /// mask otherwise. Never suspends.
    ///
    /// The session holds one watcher slot for this method: each call swaps
    /// in the caller's waker, and closing the session removes it. Tasks that
    /// wait on the same session concurrently should use
    /// [`poll_with`](Self::poll_with) or [`PollMany`](crate::driver::PollMany),
    /// which keep a registration per waiter.
    pub fn poll(&self, cx: &mut Context<'_>) -> ReadinessMask {
        let notifier = self.device.notifier();
        let registered = self.watch.with(|watch| notifier.watch(watch, cx.waker()));
        if !registered {
            cx.waker().wake_by_ref();
        }
        self.readiness()
    }

    /// [`poll`](Self::poll) with a registration owned by the caller.
    ///
    /// `watch` starts out `None`; pass the same slot on every poll and hand
    /// it to [`unwatch`](Self::unwatch) when giving up before an event.
    pub fn poll_with(&self, cx: &mut Context<'_>, watch: &mut Option<WaitKey>) -> ReadinessMask {
        if !self.device.notifier().watch(watch, cx.waker()) {
            cx.waker().wake_by_ref();
        }
        self.readiness()
    }

    /// Remove a registration made by [`poll_with`](Self::poll_with)
    pub fn unwatch(&self, watch: &mut Option<WaitKey>) {
        self.device.notifier().unwatch(watch);
    }

    fn readiness(&self) -> ReadinessMask {
        let device = self.device;
        if !device.is_online() {
            return ReadinessMask::HANGUP;
        }
        if device.conversion_state().is_ready() {
            ReadinessMask::READABLE
        } else {
            ReadinessMask::EMPTY
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Select the conversion resolution (10 or 12 bits).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] for any other width,
    /// [`Error::Unavailable`] if the device is offline.
    pub fn set_resolution(&self, bits: u32) -> Result<()> {
        let resolution = Resolution::from_bits(bits)?;
        self.control(ControlRequest::SetResolution(resolution))
    }

    /// ioctl-style entry point: decode `cmd`/`arg` and apply the request.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] for unknown commands or bad arguments.
    pub fn ioctl(&self, cmd: u32, arg: usize) -> Result<()> {
        self.control(ControlRequest::decode(cmd, arg)?)
    }

    /// Apply a decoded control request
    pub fn control(&self, request: ControlRequest) -> Result<()> {
        if !self.device.is_online() {
            return Err(Error::Unavailable);
        }
        match request {
            ControlRequest::SetResolution(resolution) => {
                debug!(
                    "{}: set resolution {} bits",
                    self.device.number().minor,
                    resolution.bits()
                );
                self.device.registers().set_resolution(resolution);
            }
        }
        Ok(())
    }

    /// Close the session. Equivalent to dropping it.
    pub fn close(self) {}
}

impl<R: RegisterIo, const W: usize> Pollable for Session<'_, R, W> {
    fn poll_readiness(&self, cx: &mut Context<'_>, watch: &mut Option<WaitKey>) -> ReadinessMask {
        self.poll_with(cx, watch)
    }

    fn release_readiness(&self, watch: &mut Option<WaitKey>) {
        self.unwatch(watch);
    }

    fn take_interrupt(&self) -> bool {
        self.pending_interrupt.take()
    }
}

impl<R: RegisterIo, const W: usize> Drop for Session<'_, R, W> {
    fn drop(&mut self) {
        let mut watch = self.watch.with(Option::take);
        self.device.notifier().unwatch(&mut watch);
        self.device.release_session();
    }
}

impl<R: RegisterIo, const W: usize> core::fmt::Debug for Session<'_, R, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.device.number())
            .field("nonblocking", &self.is_nonblocking())
            .field("interrupt_pending", &self.pending_interrupt.is_pending())
            .finish()
    }
}
