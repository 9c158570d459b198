// Session controller: Idle → Tracking → Stopped state machine scoping the
// debouncers, ledgers and recorder to one case across the four views.
// Single-threaded and synchronous; every mutation happens inside these calls.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::error::TrackerError;
use crate::ledger::DwellLedger;
use crate::recorder::EventRecorder;
use crate::regions::{RegionCatalog, RegionId};
use crate::summary::{summarize_view, SummaryScheduler};
use crate::types::{
    AttentionSummary, FrameGeometry, RegionCoverage, Timestamp, TrackerConfig, ViewKey,
    ViewportEvent, ViewportState,
};
use crate::{viewport, visibility};

/// Invoked once per accepted sample (telemetry/logging collaborator).
pub type EventSink = Box<dyn FnMut(&ViewportEvent)>;
/// Invoked on the periodic tick and on `stop()` (overlay/export collaborator).
pub type SummarySink = Box<dyn FnMut(&HashMap<ViewKey, AttentionSummary>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Tracking,
    Stopped,
}

struct ViewTracking {
    debouncer: Debouncer,
    ledger: DwellLedger,
    last_raw_at: Option<Timestamp>,
}

/// Owned session object injected into the UI layer; the imperative tracking
/// handle, minus the framework plumbing.
pub struct AttentionTracker {
    config: TrackerConfig,
    catalog: RegionCatalog,
    state: SessionState,
    case_id: Option<String>,
    /// Panel geometry outlives cases; resize and case navigation are
    /// independent.
    geometry: HashMap<ViewKey, FrameGeometry>,
    views: HashMap<ViewKey, ViewTracking>,
    recorder: EventRecorder,
    scheduler: SummaryScheduler,
    final_summaries: Option<HashMap<ViewKey, AttentionSummary>>,
    event_sink: Option<EventSink>,
    summary_sink: Option<SummarySink>,
}

impl AttentionTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let scheduler = SummaryScheduler::new(config.update_interval_ms);
        let mut tracker = AttentionTracker {
            config,
            catalog: RegionCatalog::standard(),
            state: SessionState::Idle,
            case_id: None,
            geometry: HashMap::new(),
            views: HashMap::new(),
            recorder: EventRecorder::new(),
            scheduler,
            final_summaries: None,
            event_sink: None,
            summary_sink: None,
        };
        tracker.rebuild_views(Timestamp::from_millis(0));
        tracker
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn set_event_sink(&mut self, sink: EventSink) {
        self.event_sink = Some(sink);
    }

    pub fn set_summary_sink(&mut self, sink: SummarySink) {
        self.summary_sink = Some(sink);
    }

    /// Called on layout/resize. Rejects degenerate dimensions without
    /// mutating any state.
    pub fn set_frame_geometry(
        &mut self,
        view: ViewKey,
        geometry: FrameGeometry,
    ) -> Result<(), TrackerError> {
        geometry.validate()?;
        self.geometry.insert(view, geometry);
        Ok(())
    }

    /// Idle/Stopped → Tracking. Starting the case already being tracked is a
    /// no-op so redundant calls never discard in-progress dwell.
    pub fn start(&mut self, case_id: &str, now: Timestamp) {
        if self.state == SessionState::Tracking && self.case_id.as_deref() == Some(case_id) {
            debug!("start({case_id}): already tracking, ignoring");
            return;
        }
        self.discard_session_state(now);
        self.case_id = Some(case_id.to_string());
        self.state = SessionState::Tracking;
        info!("attention tracking started for case {case_id}");
    }

    /// Any state → Idle, discarding the previous case's ledgers and events.
    /// Resetting to the currently-tracked case is a no-op.
    pub fn reset(&mut self, case_id: &str) {
        if self.state == SessionState::Tracking && self.case_id.as_deref() == Some(case_id) {
            debug!("reset({case_id}): case already tracking, ignoring");
            return;
        }
        self.discard_session_state(Timestamp::from_millis(0));
        self.case_id = None;
        self.state = SessionState::Idle;
        info!("attention tracking reset for case {case_id}");
    }

    /// Route one raw pan/zoom/window-level update through the debouncer and,
    /// for each accepted sample, through normalization, visibility and the
    /// ledger. A no-op unless Tracking (expected race during case
    /// transitions).
    pub fn record_update(
        &mut self,
        view: ViewKey,
        viewport: ViewportState,
        now: Timestamp,
    ) -> Result<(), TrackerError> {
        if self.state != SessionState::Tracking {
            debug!("record_update on {view} ignored: not tracking");
            return Ok(());
        }
        if !viewport.zoom.is_finite()
            || viewport.zoom <= 0.0
            || !viewport.window_width.is_finite()
            || viewport.window_width <= 0.0
        {
            return Err(TrackerError::InvalidViewport {
                zoom: viewport.zoom,
                window_width: viewport.window_width,
            });
        }
        if !self.geometry.contains_key(&view) {
            return Err(TrackerError::MissingGeometry(view));
        }

        let Some(tracking) = self.views.get_mut(&view) else {
            return Ok(());
        };
        if let Some(last) = tracking.last_raw_at {
            if now < last {
                return Err(TrackerError::TimestampRegression {
                    view,
                    previous_ms: last.as_millis(),
                    current_ms: now.as_millis(),
                });
            }
        }
        tracking.last_raw_at = Some(now);

        let accepted = tracking.debouncer.offer(viewport, now);
        for (sample, at) in accepted {
            self.process_accepted(view, sample, at)?;
        }
        Ok(())
    }

    /// Tracking → Stopped. Flushes every pending debounced sample so the
    /// final partial interval is integrated, then freezes the summary map.
    /// Idempotent: a second call returns the identical map.
    pub fn stop(&mut self, now: Timestamp) -> Result<HashMap<ViewKey, AttentionSummary>, TrackerError> {
        match self.state {
            SessionState::Stopped => Ok(self.final_summaries.clone().unwrap_or_default()),
            SessionState::Idle => {
                warn!("stop() called while idle");
                Ok(self.compute_summaries())
            }
            SessionState::Tracking => {
                for view in ViewKey::ALL {
                    let pending = self
                        .views
                        .get_mut(&view)
                        .and_then(|tracking| tracking.debouncer.flush());
                    if let Some((sample, at)) = pending {
                        self.process_accepted(view, sample, at)?;
                    }
                }
                let summaries = self.compute_summaries();
                self.final_summaries = Some(summaries.clone());
                self.state = SessionState::Stopped;
                self.scheduler.emitted(now);
                if let Some(sink) = self.summary_sink.as_mut() {
                    sink(&summaries);
                }
                info!(
                    "attention tracking stopped for case {} after {} events",
                    self.case_id.as_deref().unwrap_or("?"),
                    self.recorder.len()
                );
                Ok(summaries)
            }
        }
    }

    /// Periodic timer entry point. Emits a summary map only if new events
    /// arrived since the last emission and the update interval elapsed. The
    /// host owns (and must cancel) the timer itself.
    pub fn tick(&mut self, now: Timestamp) -> Option<HashMap<ViewKey, AttentionSummary>> {
        if self.state != SessionState::Tracking || !self.scheduler.should_emit(now) {
            return None;
        }
        let summaries = self.compute_summaries();
        self.scheduler.emitted(now);
        if let Some(sink) = self.summary_sink.as_mut() {
            sink(&summaries);
        }
        Some(summaries)
    }

    /// Current per-view summaries; the frozen map once Stopped.
    pub fn summaries(&self) -> HashMap<ViewKey, AttentionSummary> {
        if self.state == SessionState::Stopped {
            if let Some(cached) = &self.final_summaries {
                return cached.clone();
            }
        }
        self.compute_summaries()
    }

    /// Flat event log across all views, in acceptance order.
    pub fn events(&self) -> &[ViewportEvent] {
        self.recorder.events()
    }

    /// Ordered event log for one view.
    pub fn events_for(&self, view: ViewKey) -> Vec<ViewportEvent> {
        self.recorder.events_for(view).cloned().collect()
    }

    /// Running coverage ledger per view.
    pub fn coverage(&self) -> HashMap<ViewKey, BTreeMap<RegionId, RegionCoverage>> {
        self.views
            .iter()
            .map(|(view, tracking)| (*view, tracking.ledger.coverage().clone()))
            .collect()
    }

    fn discard_session_state(&mut self, started_at: Timestamp) {
        self.rebuild_views(started_at);
        self.recorder = EventRecorder::new();
        self.scheduler = SummaryScheduler::new(self.config.update_interval_ms);
        self.final_summaries = None;
    }

    /// All four views are torn down and recreated together; there is no
    /// partial reset.
    fn rebuild_views(&mut self, started_at: Timestamp) {
        self.views = ViewKey::ALL
            .into_iter()
            .map(|view| {
                (
                    view,
                    ViewTracking {
                        debouncer: Debouncer::new(self.config.debounce_ms),
                        ledger: DwellLedger::new(self.config.min_dwell_ms, started_at),
                        last_raw_at: None,
                    },
                )
            })
            .collect();
    }

    fn process_accepted(
        &mut self,
        view: ViewKey,
        sample: ViewportState,
        at: Timestamp,
    ) -> Result<(), TrackerError> {
        let geometry = *self
            .geometry
            .get(&view)
            .ok_or(TrackerError::MissingGeometry(view))?;
        let rect = viewport::visible_rect(&sample, &geometry)?;
        let visible =
            visibility::visible_fractions(&rect, view, &self.catalog, self.config.min_visibility);

        let case_id = self.case_id.clone().unwrap_or_default();
        let event = self
            .recorder
            .append(&case_id, view, sample, at, visible.clone())?
            .clone();

        if let Some(tracking) = self.views.get_mut(&view) {
            tracking.ledger.observe(at, &visible);
        }
        self.scheduler.mark_dirty();

        if let Some(sink) = self.event_sink.as_mut() {
            sink(&event);
        }
        Ok(())
    }

    fn compute_summaries(&self) -> HashMap<ViewKey, AttentionSummary> {
        self.views
            .iter()
            .map(|(view, tracking)| (*view, summarize_view(*view, &tracking.ledger, &self.catalog)))
            .collect()
    }
}
