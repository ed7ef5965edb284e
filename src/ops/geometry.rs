// ============================================================================
// GEOMETRY — display scaling, aspect fitting, display <-> source mapping
// ============================================================================

use crate::components::history::CropData;

/// Scaled-down on-screen size of an image, plus the factor used to get there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    pub original_width: u32,
    pub original_height: u32,
    pub display_width: f32,
    pub display_height: f32,
    /// Always in `(0, 1]`; small images are never upscaled.
    pub display_scale: f32,
}

/// Width/height pair in display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle in display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Fixed crop aspect ratios offered by the trimming controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    #[default]
    Square,
    Wide16x9,
    Photo5x4,
    Photo7x5,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Wide16x9,
        AspectRatio::Photo5x4,
        AspectRatio::Photo7x5,
    ];

    /// `(width, height)` ratio terms.
    pub fn terms(self) -> (f32, f32) {
        match self {
            AspectRatio::Square => (1.0, 1.0),
            AspectRatio::Wide16x9 => (16.0, 9.0),
            AspectRatio::Photo5x4 => (5.0, 4.0),
            AspectRatio::Photo7x5 => (7.0, 5.0),
        }
    }

    pub fn value(self) -> f32 {
        let (w, h) = self.terms();
        w / h
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide16x9 => "16:9",
            AspectRatio::Photo5x4 => "5:4",
            AspectRatio::Photo7x5 => "7:5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == s.trim())
    }
}

/// Fit `width x height` inside `max_w x max_h` without ever scaling up.
pub fn compute_display_geometry(width: u32, height: u32, max_w: f32, max_h: f32) -> DisplayGeometry {
    // A zero-sized decode is treated as 1px so the scale stays finite
    let w = width.max(1);
    let h = height.max(1);
    let scale_x = max_w / w as f32;
    let scale_y = max_h / h as f32;
    let display_scale = scale_x.min(scale_y).min(1.0);

    DisplayGeometry {
        original_width: w,
        original_height: h,
        display_width: w as f32 * display_scale,
        display_height: h as f32 * display_scale,
        display_scale,
    }
}

/// Largest rectangle of `ratio` that fits in the bounds. Width-constrained
/// first; falls back to height-constrained when the width fit is too tall.
pub fn compute_aspect_rect(ratio: AspectRatio, bound_w: f32, bound_h: f32) -> Size {
    let value = ratio.value();

    let mut width = bound_w;
    let mut height = width / value;

    if height > bound_h {
        height = bound_h;
        width = height * value;
    }

    Size { width, height }
}

/// Center `size` in the bounds, then push it back inside any edge it crosses.
pub fn centered_rect(size: Size, bound_w: f32, bound_h: f32) -> Rect {
    let mut x = (bound_w - size.width) / 2.0;
    let mut y = (bound_h - size.height) / 2.0;

    if x + size.width > bound_w {
        x = bound_w - size.width;
    }
    if y + size.height > bound_h {
        y = bound_h - size.height;
    }
    x = x.max(0.0);
    y = y.max(0.0);

    Rect::new(x, y, size.width, size.height)
}

/// Map a display-space rectangle back to source pixels.
///
/// `offset` is where the image's top-left corner sits in display space.
/// Rounding can overshoot the image edge by a pixel; the result is clamped
/// rather than rejected.
pub fn to_source_coordinates(rect: Rect, geometry: &DisplayGeometry, offset: (f32, f32)) -> CropData {
    let scale = geometry.display_scale;
    let img_w = geometry.original_width;
    let img_h = geometry.original_height;

    let sx = ((rect.x - offset.0) / scale).round().max(0.0) as u32;
    let sy = ((rect.y - offset.1) / scale).round().max(0.0) as u32;
    let sw = (rect.width / scale).round().max(1.0) as u32;
    let sh = (rect.height / scale).round().max(1.0) as u32;

    let x = sx.min(img_w - 1);
    let y = sy.min(img_h - 1);

    CropData {
        x,
        y,
        width: sw.min(img_w - x),
        height: sh.min(img_h - y),
    }
}

/// Forward transform of [`to_source_coordinates`].
pub fn to_display_rect(crop: &CropData, geometry: &DisplayGeometry, offset: (f32, f32)) -> Rect {
    let scale = geometry.display_scale;
    Rect::new(
        crop.x as f32 * scale + offset.0,
        crop.y as f32 * scale + offset.1,
        crop.width as f32 * scale,
        crop.height as f32 * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_W: f32 = 320.0;
    const MAX_H: f32 = 380.0;

    #[test]
    fn display_geometry_stays_inside_bounds() {
        let sizes = [(1, 1), (320, 380), (1000, 2000), (4000, 3000), (5, 9000), (9000, 5), (100, 100)];
        for (w, h) in sizes {
            let g = compute_display_geometry(w, h, MAX_W, MAX_H);
            assert!(g.display_width <= MAX_W + 1e-3, "{w}x{h}: {g:?}");
            assert!(g.display_height <= MAX_H + 1e-3, "{w}x{h}: {g:?}");
            assert!(g.display_scale <= 1.0);
            assert!(g.display_scale > 0.0);
        }
    }

    #[test]
    fn display_geometry_never_upscales() {
        let g = compute_display_geometry(100, 50, MAX_W, MAX_H);
        assert_eq!(g.display_scale, 1.0);
        assert_eq!(g.display_width, 100.0);
        assert_eq!(g.display_height, 50.0);
    }

    #[test]
    fn display_geometry_picks_tighter_axis() {
        let g = compute_display_geometry(1000, 2000, MAX_W, MAX_H);
        assert!((g.display_scale - 0.19).abs() < 1e-6);
        assert!((g.display_height - 380.0).abs() < 1e-3);
        assert!((g.display_width - 190.0).abs() < 1e-3);
    }

    #[test]
    fn aspect_rect_fits_and_keeps_ratio() {
        let bounds = [(320.0, 380.0), (380.0, 320.0), (100.0, 10.0), (10.0, 100.0), (190.0, 380.0)];
        for ratio in AspectRatio::ALL {
            for (bw, bh) in bounds {
                let s = compute_aspect_rect(ratio, bw, bh);
                assert!(s.width <= bw + 1e-3 && s.height <= bh + 1e-3, "{ratio:?} in {bw}x{bh}: {s:?}");
                assert!((s.width / s.height - ratio.value()).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn aspect_rect_prefers_width_fit() {
        let s = compute_aspect_rect(AspectRatio::Wide16x9, 320.0, 380.0);
        assert_eq!(s.width, 320.0);
        assert!((s.height - 180.0).abs() < 1e-3);

        let s = compute_aspect_rect(AspectRatio::Square, 320.0, 200.0);
        assert_eq!(s.width, 200.0);
        assert_eq!(s.height, 200.0);
    }

    #[test]
    fn aspect_ratio_labels_parse() {
        for ratio in AspectRatio::ALL {
            assert_eq!(AspectRatio::parse(ratio.label()), Some(ratio));
        }
        assert_eq!(AspectRatio::parse("4:3"), None);
    }

    #[test]
    fn centered_rect_is_centered() {
        let r = centered_rect(Size { width: 100.0, height: 50.0 }, 300.0, 150.0);
        assert_eq!(r, Rect::new(100.0, 50.0, 100.0, 50.0));
    }

    #[test]
    fn source_round_trip_within_one_pixel() {
        let g = compute_display_geometry(1000, 2000, MAX_W, MAX_H);
        let rects = [
            Rect::new(0.0, 0.0, 190.0, 380.0),
            Rect::new(13.3, 27.9, 77.7, 101.1),
            Rect::new(100.0, 200.0, 50.0, 50.0),
        ];
        for r in rects {
            let crop = to_source_coordinates(r, &g, (0.0, 0.0));
            let back = to_display_rect(&crop, &g, (0.0, 0.0));
            assert!((back.x - r.x).abs() <= 1.0, "{r:?} -> {back:?}");
            assert!((back.y - r.y).abs() <= 1.0, "{r:?} -> {back:?}");
            assert!((back.width - r.width).abs() <= 1.0, "{r:?} -> {back:?}");
            assert!((back.height - r.height).abs() <= 1.0, "{r:?} -> {back:?}");
        }
    }

    #[test]
    fn source_coordinates_subtract_offset() {
        let g = compute_display_geometry(200, 200, MAX_W, MAX_H);
        let crop = to_source_coordinates(Rect::new(15.0, 25.0, 50.0, 60.0), &g, (10.0, 20.0));
        assert_eq!(crop, CropData { x: 5, y: 5, width: 50, height: 60 });
    }

    #[test]
    fn source_coordinates_clamp_overshoot() {
        let g = compute_display_geometry(1000, 2000, MAX_W, MAX_H);
        // Full-canvas selection nudged past the edge by float error
        let crop = to_source_coordinates(Rect::new(0.1, 0.0, 190.2, 380.3), &g, (0.0, 0.0));
        assert!(crop.x + crop.width <= 1000);
        assert!(crop.y + crop.height <= 2000);

        let crop = to_source_coordinates(Rect::new(-3.0, -3.0, 20.0, 20.0), &g, (0.0, 0.0));
        assert_eq!((crop.x, crop.y), (0, 0));
    }
}
