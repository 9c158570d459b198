// Strong typing over strings. Newtypes for timestamps and image-fraction geometry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::regions::RegionId;

/// Timestamp in milliseconds since an arbitrary host epoch (e.g. `performance.now()`).
/// The engine never reads a clock; every time-dependent call takes one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Elapsed milliseconds since `earlier`, zero if `earlier` is in the future.
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Breast side as displayed. Image-fraction coordinates put the chest wall at
/// x = 0 for right-laterality views and x = 1 for left-laterality views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Laterality {
    Left,
    Right,
}

/// Mammographic projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Projection {
    /// Craniocaudal (top-down).
    Craniocaudal,
    /// Mediolateral oblique (angled side view, includes axilla).
    MediolateralOblique,
}

/// One of the four fixed display panels: two lateralities × two projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewKey {
    Lcc,
    Rcc,
    Lmlo,
    Rmlo,
}

impl ViewKey {
    pub const ALL: [ViewKey; 4] = [ViewKey::Lcc, ViewKey::Rcc, ViewKey::Lmlo, ViewKey::Rmlo];

    pub fn laterality(&self) -> Laterality {
        match self {
            ViewKey::Lcc | ViewKey::Lmlo => Laterality::Left,
            ViewKey::Rcc | ViewKey::Rmlo => Laterality::Right,
        }
    }

    pub fn projection(&self) -> Projection {
        match self {
            ViewKey::Lcc | ViewKey::Rcc => Projection::Craniocaudal,
            ViewKey::Lmlo | ViewKey::Rmlo => Projection::MediolateralOblique,
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewKey::Lcc => "LCC",
            ViewKey::Rcc => "RCC",
            ViewKey::Lmlo => "LMLO",
            ViewKey::Rmlo => "RMLO",
        };
        f.write_str(s)
    }
}

impl FromStr for ViewKey {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LCC" => Ok(ViewKey::Lcc),
            "RCC" => Ok(ViewKey::Rcc),
            "LMLO" => Ok(ViewKey::Lmlo),
            "RMLO" => Ok(ViewKey::Rmlo),
            other => Err(crate::error::TrackerError::UnknownView(other.to_string())),
        }
    }
}

/// Current display transform for one view. Mutated only by accepted samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Zoom multiplier over the aspect-fit scale; 1.0 shows the whole image.
    pub zoom: f64,
    /// Pan offset in container pixels, positive moves the image right.
    pub pan_x: f64,
    /// Pan offset in container pixels, positive moves the image down.
    pub pan_y: f64,
    /// Window-level center (display units; carried through for replay, does
    /// not affect geometry).
    pub window_center: f64,
    /// Window-level width, must be positive.
    pub window_width: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        ViewportState {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            window_center: 0.5,
            window_width: 1.0,
        }
    }
}

/// Container and image pixel sizes, set independently of viewport manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub container_width: f64,
    pub container_height: f64,
    pub image_width: f64,
    pub image_height: f64,
}

impl FrameGeometry {
    /// Construct validated geometry. All four dimensions must be positive.
    pub fn new(
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> Result<Self, crate::error::TrackerError> {
        let geometry = FrameGeometry {
            container_width,
            container_height,
            image_width,
            image_height,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), crate::error::TrackerError> {
        let dims = [
            self.container_width,
            self.container_height,
            self.image_width,
            self.image_height,
        ];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(crate::error::TrackerError::InvalidGeometry {
                container_width: self.container_width,
                container_height: self.container_height,
                image_width: self.image_width,
                image_height: self.image_height,
            });
        }
        Ok(())
    }
}

/// Axis-aligned rectangle in [0,1]×[0,1] image-fraction coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl NormalizedRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        NormalizedRect { x0, y0, x1, y1 }
    }

    /// The full image.
    pub fn unit() -> Self {
        NormalizedRect::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Intersection with another rect; zero-area result if disjoint.
    pub fn intersect(&self, other: &NormalizedRect) -> NormalizedRect {
        NormalizedRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Clamp both corners to the unit square.
    pub fn clamp_unit(&self) -> NormalizedRect {
        NormalizedRect {
            x0: self.x0.clamp(0.0, 1.0),
            y0: self.y0.clamp(0.0, 1.0),
            x1: self.x1.clamp(0.0, 1.0),
            y1: self.y1.clamp(0.0, 1.0),
        }
    }
}

/// One immutable record per accepted sample. Append-only; ordering is the
/// sequence of acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportEvent {
    /// Strictly increasing per (case, view).
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub case_id: String,
    pub view: ViewKey,
    pub viewport: ViewportState,
    /// Regions at or above the visibility threshold, with the fraction of
    /// each region's own area currently on screen.
    pub visible_regions: Vec<(RegionId, f64)>,
}

/// Mutable running ledger entry, one per (case, view, region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCoverage {
    pub region: RegionId,
    pub total_dwell_ms: f64,
    /// Fixation-like visits only; sub-threshold transits are not counted.
    pub visit_count: u32,
    pub first_visible_at: Option<Timestamp>,
    pub last_visible_at: Option<Timestamp>,
    pub max_visibility_fraction: f64,
}

impl RegionCoverage {
    pub fn new(region: RegionId) -> Self {
        RegionCoverage {
            region,
            total_dwell_ms: 0.0,
            visit_count: 0,
            first_visible_at: None,
            last_visible_at: None,
            max_visibility_fraction: 0.0,
        }
    }
}

/// Derived, immutable per-view snapshot. Recomputed on each aggregation,
/// never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionSummary {
    pub view: ViewKey,
    pub total_tracked_ms: u64,
    /// Coverage entries with at least one counted visit, ranked by dwell
    /// descending.
    pub regions_visited: Vec<RegionCoverage>,
    /// Regions that accrued no dwell at all.
    pub regions_never_visited: Vec<RegionId>,
    /// Regions with any dwell / regions defined for the view.
    pub coverage_ratio: f64,
}

/// Engine configuration passed from the host, all fields optional in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Minimum spacing between accepted samples (milliseconds).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// A region is visible iff its on-screen fraction reaches this.
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f64,
    /// Contiguous visible duration below this is not counted as a visit.
    #[serde(default = "default_min_dwell_ms")]
    pub min_dwell_ms: u64,
    /// Minimum spacing between periodic summary emissions.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_min_visibility() -> f64 {
    0.15
}

fn default_min_dwell_ms() -> u64 {
    200
}

fn default_update_interval_ms() -> u64 {
    1000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            debounce_ms: default_debounce_ms(),
            min_visibility: default_min_visibility(),
            min_dwell_ms: default_min_dwell_ms(),
            update_interval_ms: default_update_interval_ms(),
        }
    }
}
