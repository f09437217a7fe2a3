//! Testing utilities and mock implementations
//!
//! Mocks for exercising the ADC driver on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use core::task::{RawWaker, RawWakerVTable, Waker};
use std::sync::Arc;

use crate::hal::mmio::RegisterIo;
use crate::internal::register::adc::{
    ADCCLRINT_OFFSET, ADCCON_ECFLG, ADCCON_OFFSET, ADCCON_READ_START, ADCDAT0_OFFSET,
    ADC_WINDOW_MIN_LEN,
};

// =============================================================================
// Mock Register File
// =============================================================================

const WORDS: usize = ADC_WINDOW_MIN_LEN / 4;

/// Mock ADC register window
///
/// Backed by atomics so one instance can be shared between a test thread
/// playing the hardware/ISR and reader threads.
///
/// ADCCON.ECFLG is owned by the mock: writes to ADCCON keep its current
/// value, and [`set_finished`](Self::set_finished) drives it. With
/// restart-on-read enabled, reading ADCDAT0 while ADCCON.READ_START is set
/// clears ECFLG, like the real converter starting its next cycle.
#[derive(Debug)]
pub struct MockRegisters {
    base: usize,
    words: [AtomicU32; WORDS],
    data_reads: AtomicUsize,
    clear_writes: AtomicUsize,
    restart_on_read: AtomicU32,
}

impl Default for MockRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegisters {
    /// Create a zeroed register file at a fake base address
    pub fn new() -> Self {
        Self::at(0xE170_0000)
    }

    /// Create a zeroed register file reporting `base` as its identity
    pub fn at(base: usize) -> Self {
        Self {
            base,
            words: [const { AtomicU32::new(0) }; WORDS],
            data_reads: AtomicUsize::new(0),
            clear_writes: AtomicUsize::new(0),
            restart_on_read: AtomicU32::new(0),
        }
    }

    /// Raw register value, without side effects
    pub fn get(&self, offset: usize) -> u32 {
        self.words[offset / 4].load(Ordering::SeqCst)
    }

    /// Force a raw register value, without side effects
    pub fn set(&self, offset: usize, value: u32) {
        self.words[offset / 4].store(value, Ordering::SeqCst);
    }

    /// Drive the end-of-conversion flag
    pub fn set_finished(&self, finished: bool) {
        let word = &self.words[ADCCON_OFFSET / 4];
        if finished {
            word.fetch_or(ADCCON_ECFLG, Ordering::SeqCst);
        } else {
            word.fetch_and(!ADCCON_ECFLG, Ordering::SeqCst);
        }
    }

    /// Complete a conversion: latch `value` into ADCDAT0 and set ECFLG
    pub fn complete_conversion(&self, value: u32) {
        self.set(ADCDAT0_OFFSET, value);
        self.set_finished(true);
    }

    /// Make reads of ADCDAT0 restart the conversion (clear ECFLG)
    pub fn set_restart_on_read(&self, enabled: bool) {
        self.restart_on_read.store(enabled as u32, Ordering::SeqCst);
    }

    /// Number of ADCDAT0 reads so far
    pub fn data_reads(&self) -> usize {
        self.data_reads.load(Ordering::SeqCst)
    }

    /// Number of ADCCLRINT writes so far
    pub fn clear_writes(&self) -> usize {
        self.clear_writes.load(Ordering::SeqCst)
    }
}

impl RegisterIo for MockRegisters {
    fn read(&self, offset: usize) -> u32 {
        let value = self.get(offset);
        if offset == ADCDAT0_OFFSET {
            self.data_reads.fetch_add(1, Ordering::SeqCst);
            let start_by_read = self.get(ADCCON_OFFSET) & ADCCON_READ_START != 0;
            if start_by_read && self.restart_on_read.load(Ordering::SeqCst) != 0 {
                self.set_finished(false);
            }
        }
        value
    }

    fn write(&self, offset: usize, value: u32) {
        match offset {
            ADCCON_OFFSET => {
                let word = &self.words[ADCCON_OFFSET / 4];
                let _ = word.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                    Some((value & !ADCCON_ECFLG) | (current & ADCCON_ECFLG))
                });
            }
            ADCCLRINT_OFFSET => {
                self.clear_writes.fetch_add(1, Ordering::SeqCst);
                self.set(offset, value);
            }
            _ => self.set(offset, value),
        }
    }

    fn base_address(&self) -> usize {
        self.base
    }
}

// =============================================================================
// Counting Waker
// =============================================================================

/// Counts how many times wakers built from it were woken
#[derive(Debug, Default)]
pub struct WakeCounter {
    count: AtomicUsize,
}

impl WakeCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Build a waker that bumps `counter` on every wake
pub fn test_waker(counter: Arc<WakeCounter>) -> Waker {
    fn clone_fn(ptr: *const ()) -> RawWaker {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        let cloned = arc.clone();
        core::mem::forget(arc);
        RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
    }

    fn wake_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        arc.count.fetch_add(1, Ordering::SeqCst);
    }

    fn wake_by_ref_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        arc.count.fetch_add(1, Ordering::SeqCst);
        core::mem::forget(arc);
    }

    fn drop_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this helper.
        unsafe {
            drop(Arc::from_raw(ptr as *const WakeCounter));
        }
    }

    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_fn, wake_fn, wake_by_ref_fn, drop_fn);

    let raw = RawWaker::new(Arc::into_raw(counter) as *const (), &VTABLE);
    // SAFETY: `raw` is built from a valid `RawWakerVTable` and pointer.
    unsafe { Waker::from_raw(raw) }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting, and can run a
/// hook on every delay to simulate hardware progressing meanwhile.
#[derive(Default)]
pub struct MockDelay<'a> {
    total_ns: u64,
    calls: usize,
    on_delay: Option<&'a dyn Fn(usize)>,
}

impl<'a> MockDelay<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook(call_index)` on every delay call
    pub fn with_hook(hook: &'a dyn Fn(usize)) -> Self {
        Self {
            total_ns: 0,
            calls: 0,
            on_delay: Some(hook),
        }
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl embedded_hal::delay::DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        if let Some(hook) = self.on_delay {
            hook(self.calls);
        }
        self.calls += 1;
    }
}
