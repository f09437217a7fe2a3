//! Synchronization between the ADC interrupt and its readers
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe
//!   interior mutability
//! - **Notifier** (`notifier`): [`CompletionNotifier`], the wait queue the
//!   interrupt handler signals, and the [`WaitUntilReady`] future
//! - **Park** (`park`): [`Park`] strategies and [`block_on_with`] for
//!   blocking reads without an executor
//!
//! # Example
//!
//! ```ignore
//! use ph_s3c_adc::sync::{CompletionNotifier, SpinPark, block_on_with};
//!
//! static NOTIFIER: CompletionNotifier = CompletionNotifier::new();
//!
//! // reader
//! block_on_with(NOTIFIER.wait_until_ready(|| adc_finished(), ()), &mut SpinPark)??;
//!
//! // interrupt
//! fn ADC_IRQ() {
//!     clear_adc_interrupt();
//!     NOTIFIER.signal_all();
//! }
//! ```

mod primitives;

pub mod notifier;
pub mod park;

pub use notifier::{CancelFlag, Cancellation, CompletionNotifier, WaitKey, WaitUntilReady};
pub use park::{DelayPark, Park, SpinPark, block_on_with};
pub use primitives::CriticalSectionCell;
