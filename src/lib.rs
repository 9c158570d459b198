// attention_core: viewport attention tracking engine for multi-view
// mammography reading. All inference lives here; the host UI is plumbing that
// forwards pan/zoom updates and renders the summaries it gets back.

mod debounce;
mod error;
mod ledger;
mod recorder;
mod regions;
mod session;
mod summary;
mod types;
mod viewport;
mod visibility;

use std::collections::BTreeMap;

use wasm_bindgen::prelude::*;

pub use debounce::Debouncer;
pub use error::TrackerError;
pub use ledger::DwellLedger;
pub use recorder::EventRecorder;
pub use regions::{polygon_area, RegionCatalog, RegionDefinition, RegionId, RegionShape};
pub use session::{AttentionTracker, EventSink, SessionState, SummarySink};
pub use summary::{summarize_view, SummaryScheduler};
pub use types::*;
pub use viewport::visible_rect;
pub use visibility::{fraction_visible, visible_fractions};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Engine interface exposed to JavaScript. String-JSON boundary to keep the
/// JS↔WASM surface to primitives; all timestamps are host-supplied
/// `performance.now()`-style milliseconds.
#[wasm_bindgen]
pub struct AttentionEngine {
    tracker: AttentionTracker,
}

#[wasm_bindgen]
impl AttentionEngine {
    /// `config_json` may be empty or partial; omitted fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<AttentionEngine, JsValue> {
        let config: TrackerConfig = if config_json.trim().is_empty() {
            TrackerConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        validate_config(&config).map_err(to_js)?;

        Ok(AttentionEngine {
            tracker: AttentionTracker::new(config),
        })
    }

    /// Report one panel's layout; call again whenever it resizes.
    pub fn set_frame_geometry(
        &mut self,
        view: &str,
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> Result<(), JsValue> {
        let view: ViewKey = view.parse().map_err(to_js)?;
        let geometry =
            FrameGeometry::new(container_width, container_height, image_width, image_height)
                .map_err(to_js)?;
        self.tracker.set_frame_geometry(view, geometry).map_err(to_js)
    }

    pub fn start(&mut self, case_id: &str, now_ms: u64) {
        self.tracker.start(case_id, Timestamp::from_millis(now_ms));
    }

    pub fn reset(&mut self, case_id: &str) {
        self.tracker.reset(case_id);
    }

    /// Forward one raw viewport update. `viewport_json` carries zoom, pan and
    /// window-level state; mid-drag frames are debounced internally.
    pub fn record_update(
        &mut self,
        view: &str,
        viewport_json: &str,
        now_ms: u64,
    ) -> Result<(), JsValue> {
        let view: ViewKey = view.parse().map_err(to_js)?;
        let viewport: ViewportState = serde_json::from_str(viewport_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid viewport: {}", e)))?;
        self.tracker
            .record_update(view, viewport, Timestamp::from_millis(now_ms))
            .map_err(to_js)
    }

    /// Finalize the session and return the frozen per-view summary map.
    pub fn stop(&mut self, now_ms: u64) -> Result<String, JsValue> {
        let summaries = self
            .tracker
            .stop(Timestamp::from_millis(now_ms))
            .map_err(to_js)?;
        to_summary_json(&summaries)
    }

    /// Periodic timer entry point; returns a summary map only when fresh
    /// events warrant one. The host owns the timer.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<String>, JsValue> {
        match self.tracker.tick(Timestamp::from_millis(now_ms)) {
            Some(summaries) => to_summary_json(&summaries).map(Some),
            None => Ok(None),
        }
    }

    pub fn state(&self) -> String {
        match self.tracker.state() {
            SessionState::Idle => "idle".to_string(),
            SessionState::Tracking => "tracking".to_string(),
            SessionState::Stopped => "stopped".to_string(),
        }
    }

    /// Current summaries on demand, without the scheduler gate.
    pub fn summaries_json(&self) -> Result<String, JsValue> {
        to_summary_json(&self.tracker.summaries())
    }

    /// Flat event log across all views, in acceptance order.
    pub fn events_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.tracker.events()).map_err(ser_to_js)
    }

    /// Running per-view, per-region coverage ledger.
    pub fn coverage_json(&self) -> Result<String, JsValue> {
        let coverage: BTreeMap<String, BTreeMap<String, RegionCoverage>> = self
            .tracker
            .coverage()
            .into_iter()
            .map(|(view, regions)| {
                let regions = regions
                    .into_iter()
                    .map(|(region, entry)| (region.to_string(), entry))
                    .collect();
                (view.to_string(), regions)
            })
            .collect();
        serde_json::to_string(&coverage).map_err(ser_to_js)
    }
}

fn validate_config(config: &TrackerConfig) -> Result<(), TrackerError> {
    if !config.min_visibility.is_finite() || !(0.0..=1.0).contains(&config.min_visibility) {
        return Err(TrackerError::InvalidConfig(format!(
            "min_visibility must be within [0, 1], got {}",
            config.min_visibility
        )));
    }
    if config.update_interval_ms == 0 {
        return Err(TrackerError::InvalidConfig(
            "update_interval_ms must be positive".to_string(),
        ));
    }
    Ok(())
}

fn to_summary_json(
    summaries: &std::collections::HashMap<ViewKey, AttentionSummary>,
) -> Result<String, JsValue> {
    let by_view: BTreeMap<String, &AttentionSummary> = summaries
        .iter()
        .map(|(view, summary)| (view.to_string(), summary))
        .collect();
    serde_json::to_string(&by_view).map_err(ser_to_js)
}

fn to_js(e: TrackerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn ser_to_js(e: serde_json::Error) -> JsValue {
    JsValue::from_str(&format!("Serialization error: {}", e))
}
