// Static anatomical region catalog in image-fraction coordinates.
// Display-space taxonomy, not strict surgical anatomy: x runs chest wall to
// nipple, y superior to inferior. Left-laterality views mirror about x = 0.5.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{Laterality, NormalizedRect, Projection, ViewKey};

/// Enumerated anatomical sector within one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionId {
    UpperOuter,
    UpperInner,
    LowerOuter,
    LowerInner,
    Retroareolar,
    Nipple,
    AxillaryTail,
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegionId::UpperOuter => "upper-outer",
            RegionId::UpperInner => "upper-inner",
            RegionId::LowerOuter => "lower-outer",
            RegionId::LowerInner => "lower-inner",
            RegionId::Retroareolar => "retroareolar",
            RegionId::Nipple => "nipple",
            RegionId::AxillaryTail => "axillary-tail",
        };
        f.write_str(s)
    }
}

/// Region geometry: an axis-aligned box or a simple (convex) polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionShape {
    Box(NormalizedRect),
    /// Vertices in image-fraction coordinates, implicitly closed.
    Polygon(Vec<(f64, f64)>),
}

impl RegionShape {
    /// Area in image-fraction units (shoelace for polygons).
    pub fn area(&self) -> f64 {
        match self {
            RegionShape::Box(rect) => rect.area(),
            RegionShape::Polygon(vertices) => polygon_area(vertices),
        }
    }

    /// Mirror about the vertical midline for the opposite laterality.
    fn mirror_x(&self) -> RegionShape {
        match self {
            RegionShape::Box(rect) => RegionShape::Box(NormalizedRect::new(
                1.0 - rect.x1,
                rect.y0,
                1.0 - rect.x0,
                rect.y1,
            )),
            RegionShape::Polygon(vertices) => {
                RegionShape::Polygon(vertices.iter().map(|&(x, y)| (1.0 - x, y)).collect())
            }
        }
    }
}

/// Absolute value of the shoelace sum; vertex winding does not matter.
pub fn polygon_area(vertices: &[(f64, f64)]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..vertices.len() {
        let (x0, y0) = vertices[i];
        let (x1, y1) = vertices[(i + 1) % vertices.len()];
        twice_area += x0 * y1 - x1 * y0;
    }
    twice_area.abs() / 2.0
}

/// Static shape for a (view, region) pair. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    pub id: RegionId,
    pub shape: RegionShape,
}

impl RegionDefinition {
    pub fn area(&self) -> f64 {
        self.shape.area()
    }
}

/// Fixed per-view region definitions. Built once at engine construction and
/// never mutated during a session.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    by_view: HashMap<ViewKey, Vec<RegionDefinition>>,
}

impl RegionCatalog {
    /// The standard four-view catalog: 2×2 quadrants plus retroareolar and
    /// nipple everywhere; the axillary tail only on MLO projections, where
    /// the axilla is actually in frame.
    pub fn standard() -> Self {
        let mut by_view = HashMap::new();
        for view in ViewKey::ALL {
            by_view.insert(view, build_view(view));
        }
        RegionCatalog { by_view }
    }

    pub fn regions_for(&self, view: ViewKey) -> &[RegionDefinition] {
        self.by_view
            .get(&view)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn region_count(&self, view: ViewKey) -> usize {
        self.regions_for(view).len()
    }
}

/// Right-laterality geometry (chest wall at x = 0); left views are mirrored.
fn build_view(view: ViewKey) -> Vec<RegionDefinition> {
    let mut defs = vec![
        RegionDefinition {
            id: RegionId::UpperOuter,
            shape: RegionShape::Box(NormalizedRect::new(0.0, 0.08, 0.45, 0.50)),
        },
        RegionDefinition {
            id: RegionId::UpperInner,
            shape: RegionShape::Box(NormalizedRect::new(0.45, 0.08, 0.85, 0.50)),
        },
        RegionDefinition {
            id: RegionId::LowerOuter,
            shape: RegionShape::Box(NormalizedRect::new(0.0, 0.50, 0.45, 0.92)),
        },
        RegionDefinition {
            id: RegionId::LowerInner,
            shape: RegionShape::Box(NormalizedRect::new(0.45, 0.50, 0.85, 0.92)),
        },
        RegionDefinition {
            id: RegionId::Retroareolar,
            shape: RegionShape::Box(NormalizedRect::new(0.60, 0.34, 0.84, 0.66)),
        },
        RegionDefinition {
            id: RegionId::Nipple,
            shape: RegionShape::Box(NormalizedRect::new(0.80, 0.42, 0.94, 0.58)),
        },
    ];

    if view.projection() == Projection::MediolateralOblique {
        defs.push(RegionDefinition {
            id: RegionId::AxillaryTail,
            shape: RegionShape::Polygon(vec![(0.0, 0.0), (0.5, 0.0), (0.0, 0.42)]),
        });
    }

    if view.laterality() == Laterality::Left {
        for def in &mut defs {
            def.shape = def.shape.mirror_x();
        }
    }

    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_all_views() {
        let catalog = RegionCatalog::standard();
        assert_eq!(catalog.region_count(ViewKey::Rcc), 6);
        assert_eq!(catalog.region_count(ViewKey::Lcc), 6);
        assert_eq!(catalog.region_count(ViewKey::Rmlo), 7);
        assert_eq!(catalog.region_count(ViewKey::Lmlo), 7);
    }

    #[test]
    fn every_region_has_positive_area_inside_unit_square() {
        let catalog = RegionCatalog::standard();
        for view in ViewKey::ALL {
            for def in catalog.regions_for(view) {
                assert!(def.area() > 0.0, "{view} {} has zero area", def.id);
                match &def.shape {
                    RegionShape::Box(rect) => {
                        assert_eq!(*rect, rect.clamp_unit(), "{view} {} out of bounds", def.id);
                    }
                    RegionShape::Polygon(vertices) => {
                        for &(x, y) in vertices {
                            assert!((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn lateralities_are_mirror_images() {
        let catalog = RegionCatalog::standard();
        let right = catalog.regions_for(ViewKey::Rmlo);
        let left = catalog.regions_for(ViewKey::Lmlo);
        for (r, l) in right.iter().zip(left) {
            assert_eq!(r.id, l.id);
            assert!((r.area() - l.area()).abs() < 1e-12);
            assert_ne!(r.shape, l.shape, "{} should be mirrored", r.id);
        }
    }

    #[test]
    fn shoelace_area_of_triangle() {
        let triangle = vec![(0.0, 0.0), (0.5, 0.0), (0.0, 0.42)];
        assert!((polygon_area(&triangle) - 0.105).abs() < 1e-12);
        // Winding direction is irrelevant.
        let reversed: Vec<_> = triangle.iter().rev().copied().collect();
        assert!((polygon_area(&reversed) - 0.105).abs() < 1e-12);
    }

    #[test]
    fn axillary_tail_only_on_mlo() {
        let catalog = RegionCatalog::standard();
        for view in [ViewKey::Lcc, ViewKey::Rcc] {
            assert!(catalog
                .regions_for(view)
                .iter()
                .all(|d| d.id != RegionId::AxillaryTail));
        }
        for view in [ViewKey::Lmlo, ViewKey::Rmlo] {
            assert!(catalog
                .regions_for(view)
                .iter()
                .any(|d| d.id == RegionId::AxillaryTail));
        }
    }
}
