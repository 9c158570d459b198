// Dwell accumulator: integrates elapsed time between accepted samples into
// per-region running totals. The state being integrated is "visible since the
// last sample", not the incoming sample's state. Visits are provisional until
// they outlast the minimum-dwell noise floor.

use std::collections::BTreeMap;

use crate::regions::RegionId;
use crate::types::{RegionCoverage, Timestamp};

#[derive(Debug, Clone, Copy)]
struct VisitState {
    started_at: Timestamp,
    counted: bool,
}

/// Attention ledger for one (case, view) pair.
#[derive(Debug)]
pub struct DwellLedger {
    min_dwell_ms: u64,
    started_at: Timestamp,
    last_sample_at: Option<Timestamp>,
    /// Visible set at the start of the interval currently being integrated.
    interval_visible: Vec<RegionId>,
    /// Open provisional visits for currently-visible regions.
    visits: BTreeMap<RegionId, VisitState>,
    coverage: BTreeMap<RegionId, RegionCoverage>,
}

impl DwellLedger {
    pub fn new(min_dwell_ms: u64, started_at: Timestamp) -> Self {
        DwellLedger {
            min_dwell_ms,
            started_at,
            last_sample_at: None,
            interval_visible: Vec::new(),
            visits: BTreeMap::new(),
            coverage: BTreeMap::new(),
        }
    }

    /// Integrate one accepted sample. `visible` is the new sample's visible
    /// set with per-region fractions; the elapsed interval is credited to the
    /// regions that were visible when it began.
    pub fn observe(&mut self, now: Timestamp, visible: &[(RegionId, f64)]) {
        let interval_start = self.last_sample_at.unwrap_or(self.started_at);
        let dt = now.since(interval_start) as f64;

        for region in &self.interval_visible {
            let entry = self
                .coverage
                .entry(*region)
                .or_insert_with(|| RegionCoverage::new(*region));
            entry.total_dwell_ms += dt;
            entry.last_visible_at = Some(now);
        }

        // A region visible through the whole interval up to `now` has been
        // continuously visible since its visit opened; confirm the visit once
        // it outlasts the noise floor.
        for region in &self.interval_visible {
            if let Some(visit) = self.visits.get_mut(region) {
                if !visit.counted && now.since(visit.started_at) >= self.min_dwell_ms {
                    visit.counted = true;
                    if let Some(entry) = self.coverage.get_mut(region) {
                        entry.visit_count += 1;
                    }
                }
            }
        }

        let new_set: Vec<RegionId> = visible.iter().map(|(region, _)| *region).collect();

        // Regions dropping out of visibility: an uncounted visit is transit
        // noise and is discarded (its raw time stays in total_dwell_ms).
        self.visits.retain(|region, _| new_set.contains(region));

        for (region, fraction) in visible {
            let entry = self
                .coverage
                .entry(*region)
                .or_insert_with(|| RegionCoverage::new(*region));
            if *fraction > entry.max_visibility_fraction {
                entry.max_visibility_fraction = *fraction;
            }
            if !self.interval_visible.contains(region) {
                entry.first_visible_at.get_or_insert(now);
                let counted = self.min_dwell_ms == 0;
                if counted {
                    entry.visit_count += 1;
                }
                self.visits.insert(
                    *region,
                    VisitState {
                        started_at: now,
                        counted,
                    },
                );
            }
        }

        self.interval_visible = new_set;
        self.last_sample_at = Some(now);
    }

    /// Wall-clock span from tracking start to the last accepted sample.
    pub fn total_tracked_ms(&self) -> u64 {
        self.last_sample_at
            .map(|last| last.since(self.started_at))
            .unwrap_or(0)
    }

    pub fn coverage(&self) -> &BTreeMap<RegionId, RegionCoverage> {
        &self.coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    const U: RegionId = RegionId::UpperOuter;
    const L: RegionId = RegionId::LowerInner;

    #[test]
    fn single_region_dwell_matches_wall_clock_span() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        ledger.observe(at(3000), &[(U, 1.0)]);
        ledger.observe(at(5000), &[(U, 1.0)]);

        let coverage = &ledger.coverage()[&U];
        assert!((coverage.total_dwell_ms - 5000.0).abs() < 1e-9);
        assert_eq!(coverage.visit_count, 1);
        assert_eq!(ledger.total_tracked_ms(), 5000);
    }

    #[test]
    fn pan_between_disjoint_regions_splits_dwell() {
        // U on screen for 3000ms, then pan to a disjoint L for 2000ms.
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        ledger.observe(at(3000), &[(L, 1.0)]);
        ledger.observe(at(5000), &[(L, 1.0)]);

        assert!((ledger.coverage()[&U].total_dwell_ms - 3000.0).abs() < 1e-9);
        assert!((ledger.coverage()[&L].total_dwell_ms - 2000.0).abs() < 1e-9);
        assert_eq!(ledger.coverage()[&U].visit_count, 1);
        assert_eq!(ledger.coverage()[&L].visit_count, 1);
        assert_eq!(ledger.total_tracked_ms(), 5000);
    }

    #[test]
    fn interval_is_credited_to_its_starting_state() {
        let mut ledger = DwellLedger::new(0, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        // L appears at 1000; the [0, 1000) interval belongs to U alone.
        ledger.observe(at(1000), &[(L, 1.0)]);
        assert!((ledger.coverage()[&U].total_dwell_ms - 1000.0).abs() < 1e-9);
        assert!(ledger.coverage()[&L].total_dwell_ms.abs() < 1e-9);
    }

    #[test]
    fn empty_intervals_accrue_no_dwell() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[]);
        ledger.observe(at(4000), &[(U, 0.5)]);
        ledger.observe(at(5000), &[]);

        // Only [4000, 5000) was visible.
        assert!((ledger.coverage()[&U].total_dwell_ms - 1000.0).abs() < 1e-9);
        assert_eq!(ledger.total_tracked_ms(), 5000);
    }

    #[test]
    fn sub_threshold_visit_keeps_time_but_not_the_visit() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        ledger.observe(at(100), &[]); // out after 100ms < 200ms
        ledger.observe(at(1000), &[]);

        let coverage = &ledger.coverage()[&U];
        assert!((coverage.total_dwell_ms - 100.0).abs() < 1e-9);
        assert_eq!(coverage.visit_count, 0, "transit noise must not count");
        assert_eq!(coverage.first_visible_at, Some(at(0)));
    }

    #[test]
    fn rapid_in_and_out_transitions_never_confirm_a_visit() {
        let mut ledger = DwellLedger::new(200, at(0));
        let mut t = 0;
        for _ in 0..5 {
            ledger.observe(at(t), &[(U, 1.0)]);
            ledger.observe(at(t + 100), &[]);
            t += 300;
        }
        let coverage = &ledger.coverage()[&U];
        assert_eq!(coverage.visit_count, 0);
        // Each of the five passes contributed its 100ms of transit time.
        assert!((coverage.total_dwell_ms - 500.0).abs() < 1e-9);
    }

    #[test]
    fn visit_confirms_exactly_at_the_threshold() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        ledger.observe(at(200), &[]); // visible for exactly 200ms
        assert_eq!(ledger.coverage()[&U].visit_count, 1);
    }

    #[test]
    fn reentry_after_confirmed_visit_counts_again() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 1.0)]);
        ledger.observe(at(500), &[]);
        ledger.observe(at(1000), &[(U, 1.0)]);
        ledger.observe(at(1600), &[]);
        assert_eq!(ledger.coverage()[&U].visit_count, 2);
    }

    #[test]
    fn overlapping_regions_accrue_concurrently() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 0.8), (L, 0.3)]);
        ledger.observe(at(1000), &[(U, 0.8), (L, 0.3)]);

        assert!((ledger.coverage()[&U].total_dwell_ms - 1000.0).abs() < 1e-9);
        assert!((ledger.coverage()[&L].total_dwell_ms - 1000.0).abs() < 1e-9);
        // Concurrent dwell may sum past the span, but neither exceeds it.
        assert!(ledger.coverage()[&U].total_dwell_ms <= ledger.total_tracked_ms() as f64);
        assert!(ledger.coverage()[&L].total_dwell_ms <= ledger.total_tracked_ms() as f64);
    }

    #[test]
    fn max_visibility_fraction_tracks_the_peak() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(0), &[(U, 0.3)]);
        ledger.observe(at(100), &[(U, 0.9)]);
        ledger.observe(at(200), &[(U, 0.5)]);
        assert!((ledger.coverage()[&U].max_visibility_fraction - 0.9).abs() < 1e-12);
    }

    #[test]
    fn first_and_last_visible_timestamps() {
        let mut ledger = DwellLedger::new(200, at(0));
        ledger.observe(at(100), &[(U, 1.0)]);
        ledger.observe(at(900), &[(U, 1.0)]);
        ledger.observe(at(1500), &[]);
        let coverage = &ledger.coverage()[&U];
        assert_eq!(coverage.first_visible_at, Some(at(100)));
        assert_eq!(coverage.last_visible_at, Some(at(1500)));
    }

    proptest! {
        /// No region's dwell may exceed elapsed tracking time, for any sample
        /// sequence.
        #[test]
        fn dwell_never_exceeds_tracked_time(
            steps in prop::collection::vec((1u64..2000, prop::bool::ANY, prop::bool::ANY), 1..40)
        ) {
            let mut ledger = DwellLedger::new(200, at(0));
            let mut t = 0u64;
            for (dt, see_u, see_l) in steps {
                t += dt;
                let mut visible = Vec::new();
                if see_u {
                    visible.push((U, 1.0));
                }
                if see_l {
                    visible.push((L, 0.5));
                }
                ledger.observe(at(t), &visible);
            }
            let tracked = ledger.total_tracked_ms() as f64;
            for coverage in ledger.coverage().values() {
                prop_assert!(
                    coverage.total_dwell_ms <= tracked + 1e-6,
                    "{:?} dwell {} exceeds tracked {}",
                    coverage.region, coverage.total_dwell_ms, tracked
                );
            }
        }

        /// With exactly one region visible throughout, its dwell equals the
        /// span from the first to the last accepted sample.
        #[test]
        fn continuous_visibility_accounts_for_the_full_span(
            gaps in prop::collection::vec(1u64..5000, 1..30)
        ) {
            let mut ledger = DwellLedger::new(200, at(0));
            let mut t = 0u64;
            ledger.observe(at(t), &[(U, 1.0)]);
            for gap in gaps {
                t += gap;
                ledger.observe(at(t), &[(U, 1.0)]);
            }
            let coverage = &ledger.coverage()[&U];
            prop_assert!((coverage.total_dwell_ms - t as f64).abs() < 1e-6);
            prop_assert_eq!(ledger.total_tracked_ms(), t);
        }
    }
}
