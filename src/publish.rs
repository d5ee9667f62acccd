// Copyright 2025 Cowboy AI, LLC.

//! Publish-once cells
//!
//! A [`Published`] starts empty. Readers that find it empty compute a
//! candidate and try to publish it with a single compare-and-swap from
//! empty. The first successful swap wins; losers drop their candidate and
//! return the winner. Initializers must therefore be idempotent: they may
//! run more than once under contention, but every reader converges on the
//! one published value. No reader ever blocks.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::trace;

/// A lock-free, publish-once slot
pub struct Published<T> {
    slot: ArcSwapOption<T>,
}

impl<T> Published<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// The published value, if any
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    /// Whether a value has been published
    pub fn is_published(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Return the published value, computing and publishing it if absent
    pub fn get_or_publish<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.slot.load_full() {
            return value;
        }
        self.publish(Arc::new(init()))
    }

    /// Like [`Published::get_or_publish`], but nothing is published on error
    pub fn get_or_try_publish<E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.slot.load_full() {
            return Ok(value);
        }
        Ok(self.publish(Arc::new(init()?)))
    }

    fn publish(&self, candidate: Arc<T>) -> Arc<T> {
        let previous = self
            .slot
            .compare_and_swap(&None::<Arc<T>>, Some(Arc::clone(&candidate)));
        match &*previous {
            None => candidate,
            Some(winner) => {
                trace!("publish race lost; discarding candidate");
                Arc::clone(winner)
            }
        }
    }
}

impl<T> Default for Published<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Published").field(&self.get()).finish()
    }
}
