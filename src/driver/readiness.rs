//! Readiness reporting and multiplexed waits.
//!
//! [`ReadinessMask`] carries `poll(2)` event bits. [`Pollable`] is the
//! single-source readiness query that [`Session`](crate::Session)
//! implements, and [`poll_many`] / [`PollMany`] wait until at least one
//! source in a set reports an event, like `poll(2)` over several
//! descriptors.

use core::future::Future;
use core::ops::{BitOr, BitOrAssign};
use core::pin::Pin;
use core::task::{Context, Poll};

use crate::error::{Error, Result};
use crate::sync::notifier::WaitKey;
use crate::sync::park::{Park, block_on_with};

// =============================================================================
// Readiness Mask
// =============================================================================

/// `poll(2)` event bits reported by a readiness query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadinessMask(u16);

impl ReadinessMask {
    /// No events
    pub const EMPTY: Self = Self(0);
    /// `POLLIN`: data may be read without blocking
    pub const IN: Self = Self(0x0001);
    /// `POLLHUP`: the device went away
    pub const HANGUP: Self = Self(0x0010);
    /// `POLLRDNORM`: normal data may be read
    pub const RDNORM: Self = Self(0x0040);
    /// What a finished conversion reports: `POLLIN | POLLRDNORM`
    pub const READABLE: Self = Self(Self::IN.0 | Self::RDNORM.0);

    /// Build a mask from raw bits
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw `poll(2)` bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether no event is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether a read would complete without blocking
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    /// Whether the source hung up
    pub const fn is_hangup(self) -> bool {
        self.contains(Self::HANGUP)
    }
}

impl BitOr for ReadinessMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReadinessMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// =============================================================================
// Pollable Sources
// =============================================================================

/// A source that can answer a readiness query.
///
/// A waiter keeps one `watch` slot per source across polls. The source fills
/// it in when it registers the waker and clears it in
/// [`release_readiness`](Self::release_readiness), so a waiter that leaves
/// before the next event does not stay queued.
pub trait Pollable {
    /// Register `cx`'s waker under `watch`, then report the current events.
    /// Never suspends.
    fn poll_readiness(&self, cx: &mut Context<'_>, watch: &mut Option<WaitKey>) -> ReadinessMask;

    /// Drop the registration held in `watch`
    fn release_readiness(&self, watch: &mut Option<WaitKey>) {
        *watch = None;
    }

    /// Consume a pending interruption of the caller, if any
    fn take_interrupt(&self) -> bool {
        false
    }
}

impl<T: Pollable + ?Sized> Pollable for &T {
    fn poll_readiness(&self, cx: &mut Context<'_>, watch: &mut Option<WaitKey>) -> ReadinessMask {
        (**self).poll_readiness(cx, watch)
    }

    fn release_readiness(&self, watch: &mut Option<WaitKey>) {
        (**self).release_readiness(watch);
    }

    fn take_interrupt(&self) -> bool {
        (**self).take_interrupt()
    }
}

/// Future resolving once any of `M` sources reports an event.
///
/// Resolves to the number of sources with a non-empty mask; each source's
/// mask is stored in the matching `revents` slot. An interruption pending on
/// any source resolves it with [`Error::Interrupted`]. The future holds one
/// registration per source and releases all of them when it resolves or is
/// dropped.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct PollMany<'s, 'r, const M: usize> {
    sources: &'s [&'s dyn Pollable; M],
    revents: &'r mut [ReadinessMask; M],
    watches: [Option<WaitKey>; M],
}

impl<'s, 'r, const M: usize> PollMany<'s, 'r, M> {
    /// Wait on `sources`, reporting into `revents`
    pub fn new(sources: &'s [&'s dyn Pollable; M], revents: &'r mut [ReadinessMask; M]) -> Self {
        Self {
            sources,
            revents,
            watches: [None; M],
        }
    }

    fn release(&mut self) {
        for (source, watch) in self.sources.iter().zip(self.watches.iter_mut()) {
            source.release_readiness(watch);
        }
    }
}

impl<const M: usize> Future for PollMany<'_, '_, M> {
    type Output = Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let mut ready = 0;
        for index in 0..M {
            let source = this.sources[index];
            if source.take_interrupt() {
                this.release();
                return Poll::Ready(Err(Error::Interrupted));
            }
            let revents = source.poll_readiness(cx, &mut this.watches[index]);
            this.revents[index] = revents;
            if !revents.is_empty() {
                ready += 1;
            }
        }

        if ready > 0 || M == 0 {
            this.release();
            Poll::Ready(Ok(ready))
        } else {
            Poll::Pending
        }
    }
}

impl<const M: usize> Drop for PollMany<'_, '_, M> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Wait until at least one source reports an event.
///
/// Parks through `park` between passes. When `park` gives up, returns
/// `Ok(0)` with every `revents` slot empty, like `poll(2)` timing out.
pub fn poll_many<P: Park + ?Sized, const M: usize>(
    sources: &[&dyn Pollable; M],
    revents: &mut [ReadinessMask; M],
    park: &mut P,
) -> Result<usize> {
    match block_on_with(PollMany::new(sources, revents), park) {
        Ok(result) => result,
        Err(Error::TimedOut) => {
            *revents = [ReadinessMask::EMPTY; M];
            Ok(0)
        }
        Err(error) => Err(error),
    }
}

/// Single non-waiting pass over `sources` (a zero timeout).
pub fn poll_now<const M: usize>(
    sources: &[&dyn Pollable; M],
    revents: &mut [ReadinessMask; M],
) -> Result<usize> {
    struct GiveUp;

    impl Park for GiveUp {
        fn park(&mut self) -> bool {
            false
        }
    }

    poll_many(sources, revents, &mut GiveUp)
}
