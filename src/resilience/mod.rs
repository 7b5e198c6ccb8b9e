//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to store / cache / event publisher:
//!     → timeouts.rs (run as a task, race against a deadline)
//!     → On failure: retries.rs (retry safe operations with exponential backoff)
//!     → On final failure: dead_letter.rs (park the payload for inspection/redrive)
//! ```
//!
//! None of these are applied implicitly. The store decorator, the cache-aside
//! service and the event notifier opt in explicitly.

pub mod backoff;
pub mod dead_letter;
pub mod retries;
pub mod timeouts;

pub use dead_letter::{process_with_dlq, DeadLetter, DeadLetterQueue, DeadLetterSink};
pub use retries::{retry, retry_if, RetryError, RetryPolicy};
pub use timeouts::{with_timeout, TimeoutError};
