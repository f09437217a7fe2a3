//! Completion notifier: the wait/wake half of the ADC synchronization.
//!
//! The interrupt handler signals, blocked readers and poll watchers wait.
//! The notifier only carries wakeups: it never records whether a conversion
//! finished. Waiters re-read the hardware flag themselves, right after
//! registering and again every time they are polled after a wake, so a
//! signal that lands between "check" and "sleep" can never be lost:
//!
//! ```text
//! reader                         ISR
//! ------                         ---
//! ready()? no
//! register(waker)  ─┐
//!                   │            ack + signal_all()  → wakes waker
//! ready()? ────────-┘            (or the flag is already set here)
//! Pending ... woken → poll again → ready()? yes → sample
//! ```
//!
//! Storage is a fixed array of `N` slots guarded by a critical section, so
//! the interrupt side never allocates and never waits for a reader.

use core::future::Future;
use core::num::NonZeroU32;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll, Waker};

use super::primitives::CriticalSectionCell;
use crate::error::{Error, Result};
use crate::internal::constants::DEFAULT_WAITERS;
use crate::internal::fmt::trace;

// =============================================================================
// Wait Queue Storage
// =============================================================================

/// Identifies one registration in a [`CompletionNotifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitKey(NonZeroU32);

struct Entry {
    key: WaitKey,
    waker: Waker,
    /// Keyless interest; may be shared by every keyless registration of
    /// the same task
    shared: bool,
}

struct Queue<const N: usize> {
    slots: [Option<Entry>; N],
    next_key: u32,
}

impl<const N: usize> Queue<N> {
    const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            next_key: 1,
        }
    }

    fn position(&self, key: WaitKey) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(entry) if entry.key == key))
    }

    fn fresh_key(&mut self) -> WaitKey {
        loop {
            let candidate = self.next_key;
            self.next_key = self.next_key.checked_add(1).unwrap_or(1);
            if let Some(raw) = NonZeroU32::new(candidate) {
                let key = WaitKey(raw);
                if self.position(key).is_none() {
                    return key;
                }
            }
        }
    }
}

/// Outcome of a registration attempt.
enum Registered {
    /// Stored under this key; carries a waker it displaced, to be dropped
    /// outside the critical section.
    Stored(WaitKey, Option<Waker>),
    /// No free slot.
    Full,
}

// =============================================================================
// Completion Notifier
// =============================================================================

/// Wait/wake primitive fed by the ADC interrupt.
///
/// `N` is the number of waiters (blocked reads plus poll watchers) that can
/// be registered at once. When the queue is full the waker that failed to
/// register is woken immediately, so its owner re-checks instead of sleeping
/// through a completion.
pub struct CompletionNotifier<const N: usize = DEFAULT_WAITERS> {
    queue: CriticalSectionCell<Queue<N>>,
}

impl<const N: usize> Default for CompletionNotifier<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CompletionNotifier<N> {
    /// Create an empty notifier (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            queue: CriticalSectionCell::new(Queue::new()),
        }
    }

    /// Wake every registered waiter and empty the queue.
    ///
    /// Wakers are moved out under the critical section and woken after it
    /// ends. Returns the number of wakers woken.
    pub fn signal_all(&self) -> usize {
        let mut taken: [Option<Waker>; N] = [const { None }; N];
        self.queue.with(|queue| {
            for (slot, out) in queue.slots.iter_mut().zip(taken.iter_mut()) {
                *out = slot.take().map(|entry| entry.waker);
            }
        });

        let mut woken = 0;
        for waker in taken.into_iter().flatten() {
            waker.wake();
            woken += 1;
        }
        woken
    }

    /// Attach a keyless readiness watcher.
    ///
    /// The watcher is woken by the next [`signal_all`](Self::signal_all) and
    /// cannot be removed before that. Registering a waker that will wake the
    /// same task as an existing keyless entry reuses that entry, so repeated
    /// polls do not fill the queue. Prefer [`watch`](Self::watch) for
    /// watchers that may go away without being signalled.
    pub fn register_interest(&self, waker: &Waker) {
        if self.insert(None, waker, true).is_none() {
            waker.wake_by_ref();
        }
    }

    /// Attach or refresh the watcher tracked by `key`.
    ///
    /// `key` starts out `None` and is filled in on registration. Passing it
    /// back on later polls keeps the watcher in its own slot and swaps in the
    /// newest waker; [`unwatch`](Self::unwatch) removes it. Returns false,
    /// with `key` cleared, when the queue is full: the caller must not sleep
    /// on that registration.
    pub fn watch(&self, key: &mut Option<WaitKey>, waker: &Waker) -> bool {
        *key = self.insert(*key, waker, false);
        key.is_some()
    }

    /// Remove the watcher tracked by `key`, if it is still queued.
    pub fn unwatch(&self, key: &mut Option<WaitKey>) {
        if let Some(key) = key.take() {
            let removed = self.queue.with(|queue| {
                queue
                    .position(key)
                    .and_then(|index| queue.slots[index].take())
            });
            drop(removed);
        }
    }

    /// Start waiting until `ready` reports true or `cancel` fires.
    ///
    /// See [`WaitUntilReady`] for the exact check/register/re-check order.
    pub fn wait_until_ready<F, C>(&self, ready: F, cancel: C) -> WaitUntilReady<'_, N, F, C>
    where
        F: Fn() -> bool,
        C: Cancellation,
    {
        WaitUntilReady {
            notifier: self,
            ready,
            cancel,
            key: None,
        }
    }

    /// Number of registered waiters
    pub fn waiters(&self) -> usize {
        self.queue
            .with_ref(|queue| queue.slots.iter().filter(|slot| slot.is_some()).count())
    }

    /// Capacity of the wait queue
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Store `waker` under `key`, refreshing the entry if it is still
    /// queued. Returns `None` when the queue is full.
    fn insert(&self, key: Option<WaitKey>, waker: &Waker, shared: bool) -> Option<WaitKey> {
        let outcome = self.queue.with(|queue| {
            if let Some(index) = key.and_then(|key| queue.position(key)) {
                if let Some(entry) = queue.slots[index].as_mut() {
                    if entry.waker.will_wake(waker) {
                        return Registered::Stored(entry.key, None);
                    }
                    let old = core::mem::replace(&mut entry.waker, waker.clone());
                    return Registered::Stored(entry.key, Some(old));
                }
            }

            // Keyed entries belong to one waiter each: another waiter on the
            // same task must not ride on a slot its owner can remove.
            if shared
                && let Some(entry) = queue
                    .slots
                    .iter()
                    .flatten()
                    .find(|entry| entry.shared && entry.waker.will_wake(waker))
            {
                return Registered::Stored(entry.key, None);
            }

            match queue.slots.iter().position(Option::is_none) {
                Some(index) => {
                    let key = queue.fresh_key();
                    queue.slots[index] = Some(Entry {
                        key,
                        waker: waker.clone(),
                        shared,
                    });
                    Registered::Stored(key, None)
                }
                None => Registered::Full,
            }
        });

        match outcome {
            Registered::Stored(key, displaced) => {
                drop(displaced);
                Some(key)
            }
            Registered::Full => {
                trace!("wait queue full ({} slots), waking caller", N);
                None
            }
        }
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Source of cancellation for a pending wait.
///
/// `take` is called before and after every registration. Returning true
/// resolves the wait with [`Error::Interrupted`]; implementations that model
/// one-shot requests (like [`CancelFlag`]) consume the request here.
pub trait Cancellation {
    /// Check for, and consume, a cancellation request
    fn take(&self) -> bool;
}

/// Waits that cannot be cancelled
impl Cancellation for () {
    #[inline]
    fn take(&self) -> bool {
        false
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    #[inline]
    fn take(&self) -> bool {
        (**self).take()
    }
}

/// One-shot cancellation request, like a pending signal.
///
/// [`cancel`](Self::cancel) arms the flag; the next wait that observes it
/// returns [`Error::Interrupted`] and disarms it. Arming the flag does not
/// wake anyone: pair it with [`CompletionNotifier::signal_all`] so sleeping
/// waiters re-check promptly.
#[derive(Debug, Default)]
pub struct CancelFlag {
    pending: AtomicBool,
}

impl CancelFlag {
    /// Create a disarmed flag
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Arm the flag
    pub fn cancel(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a request is pending, without consuming it
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Cancellation for CancelFlag {
    #[inline]
    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

// =============================================================================
// Wait Future
// =============================================================================

/// Future returned by [`CompletionNotifier::wait_until_ready`].
///
/// Every poll runs the full sequence:
///
/// 1. cancelled? → `Err(Interrupted)`
/// 2. ready? → `Ok(())`
/// 3. register the task's waker
/// 4. cancelled? / ready? again → resolve
/// 5. `Pending`
///
/// Step 4 closes the window between the first check and the sleep. A wake
/// only means "check again": the future never resolves on the strength of a
/// wake alone. Each wait owns its queue slot, even when several waits run
/// on the same task. Dropping the future removes its registration.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitUntilReady<'a, const N: usize, F, C> {
    notifier: &'a CompletionNotifier<N>,
    ready: F,
    cancel: C,
    key: Option<WaitKey>,
}

impl<const N: usize, F, C> WaitUntilReady<'_, N, F, C>
where
    F: Fn() -> bool,
    C: Cancellation,
{
    fn check(&mut self) -> Option<Result<()>> {
        if self.cancel.take() {
            self.release();
            return Some(Err(Error::Interrupted));
        }
        if (self.ready)() {
            self.release();
            return Some(Ok(()));
        }
        None
    }

    fn release(&mut self) {
        self.notifier.unwatch(&mut self.key);
    }
}

// The future holds only references, a closure and a key; it never relies on
// being pinned.
impl<const N: usize, F, C> Unpin for WaitUntilReady<'_, N, F, C> {}

impl<const N: usize, F, C> Future for WaitUntilReady<'_, N, F, C>
where
    F: Fn() -> bool,
    C: Cancellation,
{
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(result) = this.check() {
            return Poll::Ready(result);
        }

        if !this.notifier.watch(&mut this.key, cx.waker()) {
            cx.waker().wake_by_ref();
        }

        match this.check() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

impl<const N: usize, F, C> Drop for WaitUntilReady<'_, N, F, C> {
    fn drop(&mut self) {
        self.notifier.unwatch(&mut self.key);
    }
}
