// Viewport normalizer: raw pixel pan/zoom → image-fraction visible rectangle.
// Aspect-fit scaling, zoom-aware pan conversion, clamped to image bounds.

use crate::error::TrackerError;
use crate::types::{FrameGeometry, NormalizedRect, ViewportState};

/// Compute the image fraction currently visible inside the container.
///
/// The image is aspect-fit into the container (`s = min(cw/iw, ch/ih)`) and
/// centered; `zoom` multiplies the effective scale and `pan_x`/`pan_y` move
/// the image in container pixels. Panning past an edge yields a rectangle
/// clipped at the image boundary, never negative area.
pub fn visible_rect(
    viewport: &ViewportState,
    geometry: &FrameGeometry,
) -> Result<NormalizedRect, TrackerError> {
    geometry.validate()?;
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

    let fit_scale = (geometry.container_width / geometry.image_width)
        .min(geometry.container_height / geometry.image_height);
    let scale = fit_scale * viewport.zoom;

    // Image origin in container pixels: centered, then panned.
    let origin_x =
        (geometry.container_width - geometry.image_width * scale) / 2.0 + viewport.pan_x;
    let origin_y =
        (geometry.container_height - geometry.image_height * scale) / 2.0 + viewport.pan_y;

    // Container edges mapped back into image-fraction space.
    let rect = NormalizedRect::new(
        -origin_x / (scale * geometry.image_width),
        -origin_y / (scale * geometry.image_height),
        (geometry.container_width - origin_x) / (scale * geometry.image_width),
        (geometry.container_height - origin_y) / (scale * geometry.image_height),
    );

    Ok(rect.clamp_unit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_geometry() -> FrameGeometry {
        FrameGeometry::new(100.0, 100.0, 100.0, 100.0).unwrap()
    }

    #[test]
    fn unit_zoom_shows_whole_image() {
        let rect = visible_rect(&ViewportState::default(), &square_geometry()).unwrap();
        assert_eq!(rect, NormalizedRect::unit());
    }

    #[test]
    fn double_zoom_shows_center_quarter() {
        let viewport = ViewportState {
            zoom: 2.0,
            ..Default::default()
        };
        let rect = visible_rect(&viewport, &square_geometry()).unwrap();
        assert!((rect.x0 - 0.25).abs() < 1e-9);
        assert!((rect.y0 - 0.25).abs() < 1e-9);
        assert!((rect.x1 - 0.75).abs() < 1e-9);
        assert!((rect.y1 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn pan_shifts_visible_window_against_image() {
        // Moving the image right by 50px at 2x reveals more of its left half.
        let viewport = ViewportState {
            zoom: 2.0,
            pan_x: 50.0,
            ..Default::default()
        };
        let rect = visible_rect(&viewport, &square_geometry()).unwrap();
        assert!((rect.x0 - 0.0).abs() < 1e-9);
        assert!((rect.x1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pan_past_edge_clamps_instead_of_going_negative() {
        let viewport = ViewportState {
            zoom: 1.0,
            pan_x: 500.0,
            pan_y: -500.0,
            ..Default::default()
        };
        let rect = visible_rect(&viewport, &square_geometry()).unwrap();
        assert!(rect.x0 >= 0.0 && rect.x1 <= 1.0);
        assert!(rect.y0 >= 0.0 && rect.y1 <= 1.0);
        assert!(rect.area() >= 0.0);
    }

    #[test]
    fn aspect_fit_letterboxes_wide_container() {
        // 200x100 container, 100x100 image: fit scale 1, x overscan clamps.
        let geometry = FrameGeometry::new(200.0, 100.0, 100.0, 100.0).unwrap();
        let rect = visible_rect(&ViewportState::default(), &geometry).unwrap();
        assert_eq!(rect, NormalizedRect::unit());
    }

    #[test]
    fn tall_image_fits_by_height() {
        // 800x600 container, 1000x2000 image: fit scale 0.3 by height, the
        // whole image is visible and narrower than the container.
        let geometry = FrameGeometry::new(800.0, 600.0, 1000.0, 2000.0).unwrap();
        let rect = visible_rect(&ViewportState::default(), &geometry).unwrap();
        assert_eq!(rect, NormalizedRect::unit());

        // Zooming in on the same geometry cuts both axes.
        let viewport = ViewportState {
            zoom: 4.0,
            ..Default::default()
        };
        let rect = visible_rect(&viewport, &geometry).unwrap();
        assert!(rect.width() < 1.0);
        assert!(rect.height() < 1.0);
        assert!((rect.height() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn rejects_degenerate_geometry_and_viewport() {
        let geometry = FrameGeometry {
            container_width: 800.0,
            container_height: 600.0,
            image_width: 0.0,
            image_height: 2048.0,
        };
        assert!(matches!(
            visible_rect(&ViewportState::default(), &geometry),
            Err(TrackerError::InvalidGeometry { .. })
        ));

        let viewport = ViewportState {
            zoom: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            visible_rect(&viewport, &square_geometry()),
            Err(TrackerError::InvalidViewport { .. })
        ));
    }
}
