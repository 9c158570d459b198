// Debouncer/sampler: collapses the raw pan/zoom stream into accepted samples
// at a minimum spacing, last-value-wins, without losing burst boundaries.

use crate::types::{Timestamp, ViewportState};

/// An accepted (viewport, timestamp) sample ready for integration.
pub type AcceptedSample = (ViewportState, Timestamp);

/// Single pending-sample slot per view. The first update of an interaction is
/// accepted immediately; mid-burst updates overwrite the slot; once the
/// spacing window elapses the pending settle point is flushed before the new
/// update is accepted, so both boundaries of a burst reach the ledger.
#[derive(Debug)]
pub struct Debouncer {
    debounce_ms: u64,
    last_accepted_at: Option<Timestamp>,
    pending: Option<AcceptedSample>,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Debouncer {
            debounce_ms,
            last_accepted_at: None,
            pending: None,
        }
    }

    /// Offer a raw update. Returns the samples accepted by this call, in
    /// order (at most two: a flushed settle point, then the update itself).
    pub fn offer(&mut self, viewport: ViewportState, now: Timestamp) -> Vec<AcceptedSample> {
        let mut accepted = Vec::new();
        match self.last_accepted_at {
            None => {
                self.last_accepted_at = Some(now);
                accepted.push((viewport, now));
            }
            Some(last) if now.since(last) >= self.debounce_ms => {
                if let Some(pending) = self.pending.take() {
                    accepted.push(pending);
                }
                self.last_accepted_at = Some(now);
                accepted.push((viewport, now));
            }
            Some(_) => {
                // Mid-burst: keep only the latest state.
                self.pending = Some((viewport, now));
            }
        }
        accepted
    }

    /// Drain the pending settle point, if any. Called on `stop()` so the
    /// final partial interval is integrated.
    pub fn flush(&mut self) -> Option<AcceptedSample> {
        let pending = self.pending.take();
        if let Some((_, at)) = pending {
            self.last_accepted_at = Some(at);
        }
        pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
