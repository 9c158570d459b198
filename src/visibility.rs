// Visibility calculator: intersects the normalized visible rectangle against
// the region catalog. Fractions are of the region's own area, not the screen's.

use crate::regions::{polygon_area, RegionCatalog, RegionDefinition, RegionId, RegionShape};
use crate::types::{NormalizedRect, ViewKey};

/// Fraction of one region's area currently inside `rect`, in [0, 1].
pub fn fraction_visible(rect: &NormalizedRect, region: &RegionDefinition) -> f64 {
    let region_area = region.area();
    if region_area <= 0.0 {
        return 0.0;
    }
    let overlap = match &region.shape {
        RegionShape::Box(bounds) => rect.intersect(bounds).area(),
        RegionShape::Polygon(vertices) => polygon_area(&clip_polygon_to_rect(vertices, rect)),
    };
    (overlap / region_area).clamp(0.0, 1.0)
}

/// Regions of `view` at or above `min_visibility`, in catalog order.
/// Regions below threshold are omitted but keep their coverage history.
pub fn visible_fractions(
    rect: &NormalizedRect,
    view: ViewKey,
    catalog: &RegionCatalog,
    min_visibility: f64,
) -> Vec<(RegionId, f64)> {
    catalog
        .regions_for(view)
        .iter()
        .filter_map(|region| {
            let fraction = fraction_visible(rect, region);
            (fraction >= min_visibility).then_some((region.id, fraction))
        })
        .collect()
}

/// Sutherland–Hodgman clip of a polygon against an axis-aligned rectangle.
/// Returns the clipped vertex list (possibly empty).
fn clip_polygon_to_rect(vertices: &[(f64, f64)], rect: &NormalizedRect) -> Vec<(f64, f64)> {
    // Each edge keeps the half-plane where `inside` holds; `cross` finds the
    // axis crossing between an inside and an outside vertex.
    type Edge = (fn(&(f64, f64), f64) -> bool, fn(&(f64, f64), &(f64, f64), f64) -> (f64, f64));

    fn lerp_at_x(a: &(f64, f64), b: &(f64, f64), x: f64) -> (f64, f64) {
        let t = (x - a.0) / (b.0 - a.0);
        (x, a.1 + t * (b.1 - a.1))
    }

    fn lerp_at_y(a: &(f64, f64), b: &(f64, f64), y: f64) -> (f64, f64) {
        let t = (y - a.1) / (b.1 - a.1);
        (a.0 + t * (b.0 - a.0), y)
    }

    let edges: [(Edge, f64); 4] = [
        ((|v, x0| v.0 >= x0, lerp_at_x), rect.x0),
        ((|v, x1| v.0 <= x1, lerp_at_x), rect.x1),
        ((|v, y0| v.1 >= y0, lerp_at_y), rect.y0),
        ((|v, y1| v.1 <= y1, lerp_at_y), rect.y1),
    ];

    let mut output: Vec<(f64, f64)> = vertices.to_vec();
    for ((inside, cross), bound) in edges {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        for i in 0..input.len() {
            let current = input[i];
            let previous = input[(i + input.len() - 1) % input.len()];
            let current_in = inside(&current, bound);
            let previous_in = inside(&previous, bound);
            if current_in {
                if !previous_in {
                    output.push(cross(&previous, &current, bound));
                }
                output.push(current);
            } else if previous_in {
                output.push(cross(&previous, &current, bound));
            }
        }
    }
    output
}
