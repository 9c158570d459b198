// Event recorder: append-only ordered log of accepted samples. This is the
// replayable ground truth; summaries can be reconstructed from it alone.

use std::collections::HashMap;

use crate::error::TrackerError;
use crate::regions::RegionId;
use crate::types::{Timestamp, ViewKey, ViewportEvent, ViewportState};

/// One recorder per case, shared by all four views so the flat export keeps
/// global acceptance order.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<ViewportEvent>,
    next_sequence: HashMap<ViewKey, u64>,
    last_timestamp: HashMap<ViewKey, Timestamp>,
}

impl EventRecorder {
    pub fn new() -> Self {
        EventRecorder::default()
    }

    /// Append one accepted sample. Sequence numbers are strictly increasing
    /// and timestamps non-decreasing per view; a timestamp regression is a
    /// fatal invariant violation and appends nothing.
    pub fn append(
        &mut self,
        case_id: &str,
        view: ViewKey,
        viewport: ViewportState,
        timestamp: Timestamp,
        visible_regions: Vec<(RegionId, f64)>,
    ) -> Result<&ViewportEvent, TrackerError> {
        if let Some(&previous) = self.last_timestamp.get(&view) {
            if timestamp < previous {
                return Err(TrackerError::TimestampRegression {
                    view,
                    previous_ms: previous.as_millis(),
                    current_ms: timestamp.as_millis(),
                });
            }
        }

        let sequence = self.next_sequence.entry(view).or_insert(0);
        *sequence += 1;
        self.last_timestamp.insert(view, timestamp);

        self.events.push(ViewportEvent {
            sequence: *sequence,
            timestamp,
            case_id: case_id.to_string(),
            view,
            viewport,
            visible_regions,
        });
        let index = self.events.len() - 1;
        Ok(&self.events[index])
    }

    /// Flat sequence across all views, in acceptance order.
    pub fn events(&self) -> &[ViewportEvent] {
        &self.events
    }

    /// Ordered sequence for one view.
    pub fn events_for(&self, view: ViewKey) -> impl Iterator<Item = &ViewportEvent> {
        self.events.iter().filter(move |event| event.view == view)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
