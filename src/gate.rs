//! Bounds how many classifications run at once. A trigger that finds the
//! gate full is rejected rather than queued.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct InferenceGate {
    in_flight: AtomicUsize,
    limit: usize,
}

/// Held for the lifetime of one classification; releases its slot on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a InferenceGate,
}

impl InferenceGate {
    pub fn new(limit: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            limit,
        }
    }

    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.limit).then_some(current + 1)
            })
            .ok()
            .map(|_| Permit { gate: self })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
