//! Host scenarios for the conversion-completion engine.
//!
//! Exercises the public API against a simulated converter shared with real
//! threads: one side plays the hardware and the interrupt, the other side
//! reads, polls or interrupts.
//!
//! | Test | Description |
//! |------|-------------|
//! | scenario_a | not ready, non-blocking read → `WouldBlock` |
//! | scenario_b | ready, non-blocking read → masked 12-bit value |
//! | scenario_c | blocking read woken by the interrupt returns the sample |
//! | scenario_d | blocking read interrupted → `Interrupted`, hardware untouched |
//! | scenario_e | two watchers registered before one signal both see readable |
//! | no_missed_wakeup_* | completion racing the reader's registration |
//! | joined_reads_* | two reads on one task each keep their wakeup |
//! | abandoned_watchers_* | pollers that leave unsignalled free their slots |

use std::array;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::task::{Context, Wake, Waker};
use std::thread;

use futures::FutureExt;
use futures::executor::block_on;
use futures::future::join;

use ph_s3c_adc::driver::PollMany;
use ph_s3c_adc::sync::Park;
use ph_s3c_adc::unsafe_registers::{
    ADCCLRINT_OFFSET, ADCCON_ECFLG, ADCCON_OFFSET, ADCCON_READ_START, ADCDAT0_OFFSET,
};
use ph_s3c_adc::{
    AdcConfig, AdcDevice, AttachError, DeviceNumber, DeviceRegistry, Error, IrqLine, MmioWindow,
    OpenFlags, Pollable, ReadinessMask, RegisterIo, Sample, poll_many,
};

// =============================================================================
// Simulated converter
// =============================================================================

/// Register file behaving like the TSADC in start-by-read mode: reading
/// ADCDAT0 starts the next conversion, which clears ADCCON.ECFLG.
struct Converter {
    base: usize,
    words: [AtomicU32; 8],
    data_reads: AtomicUsize,
    clear_writes: AtomicUsize,
}

impl Converter {
    fn new(base: usize) -> Self {
        Self {
            base,
            words: array::from_fn(|_| AtomicU32::new(0)),
            data_reads: AtomicUsize::new(0),
            clear_writes: AtomicUsize::new(0),
        }
    }

    fn word(&self, offset: usize) -> &AtomicU32 {
        &self.words[offset / 4]
    }

    /// Latch a result and raise the end-of-conversion flag
    fn finish(&self, value: u32) {
        self.word(ADCDAT0_OFFSET).store(value, Ordering::SeqCst);
        self.word(ADCCON_OFFSET).fetch_or(ADCCON_ECFLG, Ordering::SeqCst);
    }

    fn snapshot(&self) -> [u32; 8] {
        array::from_fn(|i| self.words[i].load(Ordering::SeqCst))
    }
}

impl RegisterIo for Converter {
    fn read(&self, offset: usize) -> u32 {
        let value = self.word(offset).load(Ordering::SeqCst);
        if offset == ADCDAT0_OFFSET {
            self.data_reads.fetch_add(1, Ordering::SeqCst);
            let con = self.word(ADCCON_OFFSET);
            if con.load(Ordering::SeqCst) & ADCCON_READ_START != 0 {
                con.fetch_and(!ADCCON_ECFLG, Ordering::SeqCst);
            }
        }
        value
    }

    fn write(&self, offset: usize, value: u32) {
        match offset {
            ADCCON_OFFSET => {
                let _ = self.word(offset).fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                    Some((value & !ADCCON_ECFLG) | (cur & ADCCON_ECFLG))
                });
            }
            ADCCLRINT_OFFSET => {
                self.clear_writes.fetch_add(1, Ordering::SeqCst);
                self.word(offset).store(value, Ordering::SeqCst);
            }
            _ => self.word(offset).store(value, Ordering::SeqCst),
        }
    }

    fn base_address(&self) -> usize {
        self.base
    }
}

type Device<'a> = AdcDevice<&'a Converter, 4>;

fn attach(hw: &Converter) -> Device<'_> {
    let adc = AdcDevice::new(hw, IrqLine::new(45), DeviceNumber::new(0));
    adc.configure(&AdcConfig::default()).unwrap();
    adc
}

/// Raise the interrupt the way the platform would
fn complete(hw: &Converter, adc: &Device<'_>, value: u32) {
    hw.finish(value);
    adc.interrupt_handler().handle();
}

/// Spin until `n` waiters are registered on `adc`
fn wait_for_waiters(adc: &Device<'_>, n: usize) {
    while adc.waiters() < n {
        thread::yield_now();
    }
}

#[derive(Default)]
struct CountingWaker(AtomicUsize);

impl Wake for CountingWaker {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct YieldPark;

impl Park for YieldPark {
    fn park(&mut self) -> bool {
        thread::yield_now();
        true
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_a_not_ready_nonblocking_would_block() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();
    let mut buf = [0u8; 4];

    assert_eq!(session.read_with(&mut buf, &mut YieldPark), Err(Error::WouldBlock));
}

#[test]
fn scenario_b_ready_nonblocking_returns_masked_value() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();
    hw.finish(0xABCD_E5A5);

    let mut buf = [0u8; 4];
    assert_eq!(session.read_with(&mut buf, &mut YieldPark), Ok(4));
    assert_eq!(u32::from_ne_bytes(buf), 0x5A5);
}

#[test]
fn scenario_c_blocking_read_woken_by_interrupt() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::BLOCKING).unwrap();

    thread::scope(|s| {
        let reader = s.spawn(|| {
            let mut buf = [0u8; 4];
            block_on(session.read_async(&mut buf)).map(|_| u32::from_ne_bytes(buf))
        });

        wait_for_waiters(&adc, 1);
        complete(&hw, &adc, 0x0777);

        assert_eq!(reader.join().unwrap(), Ok(0x777));
    });
    assert_eq!(adc.irq_count(), 1);
}

#[test]
fn scenario_d_interrupted_read_leaves_hardware_alone() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::BLOCKING).unwrap();
    let before = hw.snapshot();
    let reads_before = hw.data_reads.load(Ordering::SeqCst);

    thread::scope(|s| {
        let reader = s.spawn(|| block_on(session.read_sample()));

        wait_for_waiters(&adc, 1);
        session.interrupt();

        assert_eq!(reader.join().unwrap(), Err(Error::Interrupted));
    });

    assert_eq!(hw.snapshot(), before);
    assert_eq!(hw.data_reads.load(Ordering::SeqCst), reads_before);
    assert_eq!(hw.clear_writes.load(Ordering::SeqCst), 0);
    assert_eq!(adc.waiters(), 0);
}

#[test]
fn scenario_e_two_watchers_see_one_signal() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let first = adc.open(OpenFlags::BLOCKING).unwrap();
    let second = adc.open(OpenFlags::NONBLOCKING).unwrap();
    let a = Arc::new(CountingWaker::default());
    let b = Arc::new(CountingWaker::default());
    let waker_a = Waker::from(a.clone());
    let waker_b = Waker::from(b.clone());

    assert!(first.poll(&mut Context::from_waker(&waker_a)).is_empty());
    assert!(second.poll(&mut Context::from_waker(&waker_b)).is_empty());
    assert_eq!(adc.waiters(), 2);

    complete(&hw, &adc, 1);

    assert_eq!(a.0.load(Ordering::SeqCst), 1);
    assert_eq!(b.0.load(Ordering::SeqCst), 1);
    assert_eq!(first.poll(&mut Context::from_waker(&waker_a)), ReadinessMask::READABLE);
    assert_eq!(second.poll(&mut Context::from_waker(&waker_b)), ReadinessMask::READABLE);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn no_missed_wakeup_under_racing_completion() {
    for i in 0..300u32 {
        let hw = Converter::new(0x1000);
        let adc = attach(&hw);
        let session = adc.open(OpenFlags::BLOCKING).unwrap();
        let value = (i * 37) & 0xFFF;

        thread::scope(|s| {
            let reader = s.spawn(|| block_on(session.read_sample()));

            for _ in 0..(i % 11) {
                thread::yield_now();
            }
            complete(&hw, &adc, value);

            assert_eq!(reader.join().unwrap(), Ok(Sample::from_raw(value as u16)));
        });
    }
}

#[test]
fn no_missed_wakeup_with_many_readers() {
    let hw = Converter::new(0x1000);
    // Without restart-on-read, every reader sees the same finished conversion.
    let adc: Device<'_> = AdcDevice::new(&hw, IrqLine::new(45), DeviceNumber::new(0));
    adc.configure(&AdcConfig::default().with_start_by_read(false)).unwrap();
    let sessions: Vec<_> = (0..3).map(|_| adc.open(OpenFlags::BLOCKING).unwrap()).collect();

    thread::scope(|s| {
        let readers: Vec<_> = sessions
            .iter()
            .map(|session| s.spawn(move || block_on(session.read_sample())))
            .collect();

        wait_for_waiters(&adc, 3);
        complete(&hw, &adc, 0x42);

        for reader in readers {
            assert_eq!(reader.join().unwrap(), Ok(Sample::from_raw(0x42)));
        }
    });
}

#[test]
fn nonblocking_never_suspends() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();

    assert_eq!(session.read_sample().now_or_never(), Some(Err(Error::WouldBlock)));
    hw.finish(3);
    assert_eq!(session.read_sample().now_or_never(), Some(Ok(Sample::from_raw(3))));
    assert_eq!(adc.waiters(), 0);
}

#[test]
fn readiness_after_read_never_reports_stale_sample() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();
    let waker = Waker::from(Arc::new(CountingWaker::default()));
    let mut cx = Context::from_waker(&waker);

    hw.finish(0x100);
    assert!(session.poll(&mut cx).is_readable());
    assert_eq!(session.read_sample().now_or_never(), Some(Ok(Sample::from_raw(0x100))));

    // Reading restarted the converter: the old sample is not offered again.
    assert!(session.poll(&mut cx).is_empty());
    assert_eq!(session.read_sample().now_or_never(), Some(Err(Error::WouldBlock)));
}

#[test]
fn repeated_acknowledge_is_idempotent() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();

    hw.finish(0x0AB);
    for _ in 0..3 {
        adc.interrupt_handler().handle();
    }

    assert_eq!(hw.clear_writes.load(Ordering::SeqCst), 3);
    assert_eq!(session.read_sample().now_or_never(), Some(Ok(Sample::from_raw(0x0AB))));
}

#[test]
fn shutdown_releases_blocked_reader() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::BLOCKING).unwrap();

    thread::scope(|s| {
        let reader = s.spawn(|| block_on(session.read_sample()));
        wait_for_waiters(&adc, 1);
        adc.shutdown();
        assert_eq!(reader.join().unwrap(), Err(Error::Interrupted));
    });
    assert_eq!(adc.open(OpenFlags::BLOCKING).err(), Some(Error::Unavailable));
}

#[test]
fn poll_many_wakes_on_second_device() {
    let hw_a = Converter::new(0x1000);
    let hw_b = Converter::new(0x2000);
    let adc_a = attach(&hw_a);
    let adc_b = attach(&hw_b);
    let a = adc_a.open(OpenFlags::NONBLOCKING).unwrap();
    let b = adc_b.open(OpenFlags::NONBLOCKING).unwrap();

    thread::scope(|s| {
        let watcher = s.spawn(|| {
            let sources: [&dyn Pollable; 2] = [&a, &b];
            let mut revents = [ReadinessMask::EMPTY; 2];
            poll_many(&sources, &mut revents, &mut YieldPark).map(|n| (n, revents))
        });

        complete(&hw_b, &adc_b, 9);

        let (ready, revents) = watcher.join().unwrap().unwrap();
        assert_eq!(ready, 1);
        assert!(revents[0].is_empty());
        assert!(revents[1].is_readable());
    });
    assert_eq!(adc_a.waiters(), 0);
    assert_eq!(adc_b.waiters(), 0);
}

#[test]
fn joined_reads_on_one_task_both_complete() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let first = adc.open(OpenFlags::BLOCKING).unwrap();
    let second = adc.open(OpenFlags::BLOCKING).unwrap();

    thread::scope(|s| {
        let reader = s.spawn(|| block_on(join(first.read_sample(), second.read_sample())));

        wait_for_waiters(&adc, 2);
        complete(&hw, &adc, 1);
        wait_for_waiters(&adc, 1);
        complete(&hw, &adc, 2);

        assert_eq!(
            reader.join().unwrap(),
            (Ok(Sample::from_raw(1)), Ok(Sample::from_raw(2)))
        );
    });
    assert_eq!(adc.waiters(), 0);
}

#[test]
fn abandoned_watchers_release_their_slots() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);

    for _ in 0..4 {
        let watcher = adc.open(OpenFlags::NONBLOCKING).unwrap();
        let waker = Waker::from(Arc::new(CountingWaker::default()));
        assert!(watcher.poll(&mut Context::from_waker(&waker)).is_empty());
    }
    let session = adc.open(OpenFlags::BLOCKING).unwrap();
    for _ in 0..4 {
        let sources: [&dyn Pollable; 1] = [&session];
        let mut revents = [ReadinessMask::EMPTY; 1];
        assert!(PollMany::new(&sources, &mut revents).now_or_never().is_none());
    }
    assert_eq!(adc.waiters(), 0);

    thread::scope(|s| {
        let reader = s.spawn(|| block_on(session.read_sample()));
        wait_for_waiters(&adc, 1);
        complete(&hw, &adc, 0x321);
        assert_eq!(reader.join().unwrap(), Ok(Sample::from_raw(0x321)));
    });
}

#[test]
fn ioctl_resolution_applies_to_next_read() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();

    session
        .ioctl(ph_s3c_adc::constants::IOCTL_SET_RESOLUTION, 10)
        .unwrap();
    hw.finish(0xFFF);

    assert_eq!(session.read_sample().now_or_never(), Some(Ok(Sample::from_raw(0x3FF))));
    assert_eq!(session.ioctl(0, 0), Err(Error::InvalidRequest));
}

#[cfg(feature = "std")]
#[test]
fn thread_blocking_read() {
    let hw = Converter::new(0x1000);
    let adc = attach(&hw);
    let session = adc.open(OpenFlags::BLOCKING).unwrap();

    thread::scope(|s| {
        let reader = s.spawn(|| {
            let mut buf = [0u8; 4];
            session.read(&mut buf).map(|_| u32::from_ne_bytes(buf))
        });
        wait_for_waiters(&adc, 1);
        complete(&hw, &adc, 0x55);
        assert_eq!(reader.join().unwrap(), Ok(0x55));
    });
}

// =============================================================================
// Registry over a real memory window
// =============================================================================

#[test]
fn registry_attach_read_detach_over_mmio() {
    let registry: DeviceRegistry<2> = DeviceRegistry::new();
    let memory = Box::into_raw(Box::new([0u32; 8]));
    let base = memory as usize;

    // SAFETY: `memory` is a live, aligned 32-byte allocation until freed below.
    let window = unsafe { MmioWindow::new(base, 32) }.unwrap();
    let adc: AdcDevice<MmioWindow> = registry
        .attach(window, IrqLine::new(45), &AdcConfig::default())
        .unwrap();

    // SAFETY: write into the allocation above, as the converter would.
    unsafe {
        std::ptr::write_volatile((base + ADCDAT0_OFFSET) as *mut u32, 0x1234);
        let con = std::ptr::read_volatile((base + ADCCON_OFFSET) as *const u32);
        std::ptr::write_volatile((base + ADCCON_OFFSET) as *mut u32, con | ADCCON_ECFLG);
    }

    let session = adc.open(OpenFlags::NONBLOCKING).unwrap();
    assert_eq!(session.read_sample().now_or_never(), Some(Ok(Sample::from_raw(0x234))));
    drop(session);

    // SAFETY: same live allocation; the registry refuses it before any access.
    let second_window = unsafe { MmioWindow::new(base, 32) }.unwrap();
    let busy: Result<AdcDevice<MmioWindow>, _> =
        registry.attach(second_window, IrqLine::new(45), &AdcConfig::default());
    assert_eq!(busy.err(), Some(AttachError::WindowBusy));

    let window = registry.detach(adc).unwrap();
    assert_eq!(window.base_address(), base);
    assert_eq!(registry.attached(), 0);

    // SAFETY: no window over `memory` is used past this point.
    drop(unsafe { Box::from_raw(memory) });
}
