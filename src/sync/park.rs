//! Blocking without an executor.
//!
//! A blocking read on bare metal has no scheduler to put the caller to sleep.
//! Instead the read future is polled with a no-op waker and, between polls,
//! the caller "parks" through a [`Park`] strategy: spin, delay, or anything
//! the integration provides (WFI, an RTOS yield). Because every poll
//! re-checks the hardware flag, a parked caller can oversleep by at most one
//! park interval but can never miss a completion.

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::internal::constants::DEFAULT_PARK_INTERVAL_US;

/// Strategy for waiting between two readiness checks.
pub trait Park {
    /// Wait a little. Return `false` to abandon the wait, which surfaces as
    /// [`Error::TimedOut`].
    fn park(&mut self) -> bool;
}

impl<P: Park + ?Sized> Park for &mut P {
    #[inline]
    fn park(&mut self) -> bool {
        (**self).park()
    }
}

/// Busy-wait with a spin-loop hint. Never gives up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinPark;

impl Park for SpinPark {
    #[inline]
    fn park(&mut self) -> bool {
        core::hint::spin_loop();
        true
    }
}

/// Sleep through an [`embedded_hal::delay::DelayNs`] between checks, with an
/// optional overall budget.
#[derive(Debug)]
pub struct DelayPark<D: DelayNs> {
    delay: D,
    interval_us: u32,
    timeout_us: Option<u32>,
    elapsed_us: u32,
}

impl<D: DelayNs> DelayPark<D> {
    /// Park in [`DEFAULT_PARK_INTERVAL_US`] steps, without a timeout
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            interval_us: DEFAULT_PARK_INTERVAL_US,
            timeout_us: None,
            elapsed_us: 0,
        }
    }

    /// Set the delay between checks (minimum 1 µs)
    #[must_use]
    pub fn with_interval_us(mut self, interval_us: u32) -> Self {
        self.interval_us = interval_us.max(1);
        self
    }

    /// Give up once `timeout_us` have been spent parked
    #[must_use]
    pub fn with_timeout_us(mut self, timeout_us: u32) -> Self {
        self.timeout_us = Some(timeout_us);
        self
    }

    /// Time spent parked so far
    pub fn elapsed_us(&self) -> u32 {
        self.elapsed_us
    }

    /// Restart the timeout budget
    pub fn reset(&mut self) {
        self.elapsed_us = 0;
    }

    /// Recover the delay provider
    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Park for DelayPark<D> {
    fn park(&mut self) -> bool {
        if let Some(timeout) = self.timeout_us {
            if self.elapsed_us >= timeout {
                return false;
            }
        }
        self.delay.delay_us(self.interval_us);
        self.elapsed_us = self.elapsed_us.saturating_add(self.interval_us);
        true
    }
}

/// Drive `future` to completion on the current stack.
///
/// The future is polled with a no-op waker; `park` runs between polls.
/// Returns [`Error::TimedOut`] if `park` gives up first, in which case the
/// future is dropped (and any waiter registration with it).
pub fn block_on_with<F, P>(future: F, park: &mut P) -> Result<F::Output>
where
    F: Future,
    P: Park + ?Sized,
{
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return Ok(output);
        }
        if !park.park() {
            return Err(Error::TimedOut);
        }
    }
}
