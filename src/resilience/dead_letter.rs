//! Dead-letter accumulation.
//!
//! # Responsibilities
//! - Fan an operation out over a fixed sequence of items without stopping
//!   at the first failure
//! - Capture every failed item, in encounter order, in a sink
//! - Provide a bounded, shareable queue for failures that need later
//!   inspection or redelivery

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::observability::metrics;

/// Destination for items whose processing failed.
pub trait DeadLetterSink<T> {
    fn push_dead_letter(&mut self, item: T, error: String);
}

impl<T> DeadLetterSink<T> for Vec<T> {
    fn push_dead_letter(&mut self, item: T, _error: String) {
        self.push(item);
    }
}

impl<T> DeadLetterSink<T> for DeadLetterQueue<T> {
    fn push_dead_letter(&mut self, item: T, error: String) {
        self.push(item, error, 1);
    }
}

/// Apply `operation` to every item in order, parking failures in `sink`.
///
/// Returns the last error encountered, or `Ok(())` when every item succeeded.
pub async fn process_with_dlq<T, E, I, F, Fut, S>(
    items: I,
    mut operation: F,
    sink: &mut S,
) -> Result<(), E>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Display,
    S: DeadLetterSink<T> + ?Sized,
{
    let mut last_error = None;

    for item in items {
        if let Err(err) = operation(item.clone()).await {
            tracing::warn!(error = %err, "Item failed, moving to dead-letter sink");
            sink.push_dead_letter(item, err.to_string());
            last_error = Some(err);
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// A failed payload with failure metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter<T> {
    pub payload: T,
    /// Error message of the last failure.
    pub error: String,
    /// How many delivery attempts were made before giving up.
    pub attempts: u32,
    /// Seconds since the Unix epoch.
    pub failed_at: u64,
}

/// Bounded FIFO of dead letters, shared between clones.
///
/// When full, the oldest entry is dropped to make room.
#[derive(Debug)]
pub struct DeadLetterQueue<T> {
    queue: Arc<Mutex<VecDeque<DeadLetter<T>>>>,
    capacity: usize,
}

impl<T> DeadLetterQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, payload: T, error: String, attempts: u32) {
        let failed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() >= self.capacity {
            queue.pop_front();
            tracing::warn!(capacity = self.capacity, "Dead-letter queue full, dropping oldest entry");
        }
        queue.push_back(DeadLetter {
            payload,
            error,
            attempts,
            failed_at,
        });
        metrics::record_dead_letter_size(queue.len());
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove and return every entry, oldest first.
    pub fn drain(&self) -> Vec<DeadLetter<T>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let entries: Vec<_> = queue.drain(..).collect();
        metrics::record_dead_letter_size(0);
        entries
    }
}

impl<T: Clone> DeadLetterQueue<T> {
    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<DeadLetter<T>> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl<T> Clone for DeadLetterQueue<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            capacity: self.capacity,
        }
    }
}

impl<T> Default for DeadLetterQueue<T> {
    fn default() -> Self {
        Self::new(1000)
    }
}
