// Summary aggregator: pure, idempotent derivation of per-view attention
// summaries from the ledger, plus the dirty-flag gate for the periodic timer.

use std::cmp::Ordering;

use crate::ledger::DwellLedger;
use crate::regions::{RegionCatalog, RegionId};
use crate::types::{AttentionSummary, RegionCoverage, Timestamp, ViewKey};

/// Derive the summary for one view. Calling this twice without new samples
/// yields identical output.
pub fn summarize_view(
    view: ViewKey,
    ledger: &DwellLedger,
    catalog: &RegionCatalog,
) -> AttentionSummary {
    let coverage = ledger.coverage();

    let mut regions_visited: Vec<RegionCoverage> = coverage
        .values()
        .filter(|entry| entry.visit_count > 0)
        .cloned()
        .collect();
    regions_visited.sort_by(|a, b| {
        b.total_dwell_ms
            .partial_cmp(&a.total_dwell_ms)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });

    let defined = catalog.regions_for(view);
    let regions_never_visited: Vec<RegionId> = defined
        .iter()
        .map(|def| def.id)
        .filter(|id| {
            coverage
                .get(id)
                .map_or(true, |entry| entry.total_dwell_ms <= 0.0)
        })
        .collect();

    let with_dwell = defined
        .iter()
        .filter(|def| {
            coverage
                .get(&def.id)
                .is_some_and(|entry| entry.total_dwell_ms > 0.0)
        })
        .count();
    let coverage_ratio = if defined.is_empty() {
        0.0
    } else {
        with_dwell as f64 / defined.len() as f64
    };

    AttentionSummary {
        view,
        total_tracked_ms: ledger.total_tracked_ms(),
        regions_visited,
        regions_never_visited,
        coverage_ratio,
    }
}

/// Gate for the periodic attention-update callback: emit only when new events
/// arrived since the last emission and the update interval has elapsed.
#[derive(Debug)]
pub struct SummaryScheduler {
    update_interval_ms: u64,
    last_emitted_at: Option<Timestamp>,
    dirty: bool,
}

impl SummaryScheduler {
    pub fn new(update_interval_ms: u64) -> Self {
        SummaryScheduler {
            update_interval_ms,
            last_emitted_at: None,
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn should_emit(&self, now: Timestamp) -> bool {
        self.dirty
            && self
                .last_emitted_at
                .map_or(true, |last| now.since(last) >= self.update_interval_ms)
    }

    pub fn emitted(&mut self, now: Timestamp) {
        self.last_emitted_at = Some(now);
        self.dirty = false;
    }
}
