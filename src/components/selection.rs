use crate::ops::geometry::{AspectRatio, Rect, centered_rect, compute_aspect_rect};

// ============================================================================
// CROP SELECTION - interactive rectangle, clamped to the display canvas
// ============================================================================

/// The trimming rectangle while the user drags it around.
///
/// Mirrors a scalable canvas object: a base size plus independent x/y scale
/// factors. Every move and resize keeps the scaled rectangle inside
/// `[0, bound_w] x [0, bound_h]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropSelection {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    bound_w: f32,
    bound_h: f32,
    min_size: f32,
}

impl CropSelection {
    /// Largest rectangle of `ratio` that fits, centred on the canvas.
    pub fn fitted(ratio: AspectRatio, bound_w: f32, bound_h: f32, min_size: f32) -> Self {
        let rect = centered_rect(compute_aspect_rect(ratio, bound_w, bound_h), bound_w, bound_h);
        Self {
            left: rect.x,
            top: rect.y,
            width: rect.width,
            height: rect.height,
            scale_x: 1.0,
            scale_y: 1.0,
            bound_w,
            bound_h,
            min_size,
        }
    }

    pub fn scaled_width(&self) -> f32 {
        self.width * self.scale_x
    }

    pub fn scaled_height(&self) -> f32 {
        self.height * self.scale_y
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.bound_w, self.bound_h)
    }

    /// Display-space rectangle covered by the selection.
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.scaled_width(), self.scaled_height())
    }

    /// Refit to a new ratio: reset scale and recentre.
    pub fn refit(&mut self, ratio: AspectRatio) {
        *self = Self::fitted(ratio, self.bound_w, self.bound_h, self.min_size);
    }

    /// Drag to a new top-left corner, pushed back inside the canvas.
    pub fn move_to(&mut self, left: f32, top: f32) {
        let w = self.scaled_width();
        let h = self.scaled_height();
        self.left = left.min((self.bound_w - w).max(0.0)).max(0.0);
        self.top = top.min((self.bound_h - h).max(0.0)).max(0.0);
    }

    /// Resize from the top-left anchor.
    ///
    /// Scale factors are shrunk so the far edges stay inside the canvas and
    /// grown so neither side drops under the minimum size. On a canvas
    /// smaller than the minimum, the canvas side wins.
    pub fn scale_to(&mut self, scale_x: f32, scale_y: f32) {
        let mut sx = scale_x;
        let mut sy = scale_y;

        if self.left < 0.0 {
            self.left = 0.0;
        }
        if self.top < 0.0 {
            self.top = 0.0;
        }
        if self.left + self.width * sx > self.bound_w {
            sx = (self.bound_w - self.left) / self.width;
        }
        if self.top + self.height * sy > self.bound_h {
            sy = (self.bound_h - self.top) / self.height;
        }

        let min_side = self.min_size.min(self.bound_w).min(self.bound_h);
        let min_scale = min_side / self.width.min(self.height);
        sx = sx.max(min_scale).min(self.bound_w / self.width);
        sy = sy.max(min_scale).min(self.bound_h / self.height);

        self.scale_x = sx;
        self.scale_y = sy;

        // The minimum may have pushed the far edge out; slide back in
        self.move_to(self.left, self.top);
    }

    pub fn is_within_bounds(&self) -> bool {
        let eps = 1e-3;
        self.left >= -eps
            && self.top >= -eps
            && self.left + self.scaled_width() <= self.bound_w + eps
            && self.top + self.scaled_height() <= self.bound_h + eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(bound_w: f32, bound_h: f32) -> CropSelection {
        CropSelection::fitted(AspectRatio::Square, bound_w, bound_h, 20.0)
    }

    #[test]
    fn fitted_selection_is_centred() {
        let sel = square(190.0, 380.0);
        assert_eq!(sel.rect(), Rect::new(0.0, 95.0, 190.0, 190.0));
    }

    #[test]
    fn move_clamps_to_edges() {
        let mut sel = CropSelection::fitted(AspectRatio::Wide16x9, 320.0, 380.0, 20.0);
        sel.scale_to(0.5, 0.5);

        sel.move_to(-40.0, -10.0);
        assert_eq!((sel.left, sel.top), (0.0, 0.0));

        sel.move_to(1000.0, 1000.0);
        assert!((sel.left + sel.scaled_width() - 320.0).abs() < 1e-3);
        assert!((sel.top + sel.scaled_height() - 380.0).abs() < 1e-3);
        assert!(sel.is_within_bounds());
    }

    #[test]
    fn scale_stops_at_canvas_edge() {
        let mut sel = square(300.0, 300.0);
        sel.scale_to(0.5, 0.5);
        sel.move_to(200.0, 100.0);
        sel.scale_to(3.0, 3.0);

        assert!(sel.is_within_bounds());
        assert!((sel.left + sel.scaled_width() - 300.0).abs() < 1e-3);
        assert!((sel.top + sel.scaled_height() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn scale_respects_minimum_size() {
        let mut sel = square(300.0, 300.0);
        sel.scale_to(0.001, 0.001);
        assert!((sel.scaled_width() - 20.0).abs() < 1e-3);
        assert!((sel.scaled_height() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn minimum_never_exceeds_small_canvas() {
        let mut sel = square(10.0, 10.0);
        sel.scale_to(0.5, 0.5);
        assert!(sel.is_within_bounds());
        assert_eq!((sel.scaled_width(), sel.scaled_height()), (10.0, 10.0));

        let mut wide = CropSelection::fitted(AspectRatio::Wide16x9, 30.0, 12.0, 20.0);
        wide.scale_to(0.1, 0.1);
        assert!(wide.is_within_bounds());
        assert!((wide.scaled_height() - 12.0).abs() < 1e-3);
        assert!(wide.scaled_width() > 12.0);
    }

    #[test]
    fn move_keeps_oversized_selection_at_origin() {
        let mut sel = square(10.0, 10.0);
        sel.scale_x = 3.0;
        sel.scale_y = 3.0;
        sel.move_to(5.0, 5.0);
        assert_eq!((sel.left, sel.top), (0.0, 0.0));
    }

    #[test]
    fn refit_resets_scale() {
        let mut sel = square(320.0, 380.0);
        sel.scale_to(0.3, 0.7);
        sel.refit(AspectRatio::Photo7x5);
        assert_eq!((sel.scale_x, sel.scale_y), (1.0, 1.0));
        assert!((sel.width / sel.height - 1.4).abs() < 1e-4);
        assert!(sel.is_within_bounds());
    }
}
