// Typed errors with thiserror. Failures stay local to one (case, view) session
// and are returned as results, never panicked across the module boundary.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(
        "invalid frame geometry: container {container_width}x{container_height}, \
         image {image_width}x{image_height} (all dimensions must be positive)"
    )]
    InvalidGeometry {
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
    },

    #[error("invalid viewport: zoom {zoom} and window width {window_width} must be positive")]
    InvalidViewport { zoom: f64, window_width: f64 },

    #[error("no frame geometry set for view {0}; call set_frame_geometry first")]
    MissingGeometry(crate::types::ViewKey),

    #[error("timestamp regression on view {view}: {current_ms}ms after {previous_ms}ms")]
    TimestampRegression {
        view: crate::types::ViewKey,
        previous_ms: u64,
        current_ms: u64,
    },

    #[error("unknown view key: {0}")]
    UnknownView(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}
