// ============================================================================
// FRAME — solid border bands sized as a percentage of the active canvas
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which edges receive a band.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    /// Top and bottom.
    #[default]
    Horizontal,
    /// Left and right.
    Vertical,
    All,
}

impl FrameType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" => Some(FrameType::Horizontal),
            "vertical" => Some(FrameType::Vertical),
            "all" => Some(FrameType::All),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FrameColor {
    #[default]
    White,
    Black,
}

impl FrameColor {
    pub fn rgba(self) -> Rgba<u8> {
        match self {
            FrameColor::White => Rgba([255, 255, 255, 255]),
            FrameColor::Black => Rgba([0, 0, 0, 255]),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "white" => Some(FrameColor::White),
            "black" => Some(FrameColor::Black),
            _ => None,
        }
    }
}

/// A frame as recorded in the edit history.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameData {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// Percentage (0..=100) of half the canvas's shorter side.
    pub width: u8,
    pub color: FrameColor,
}

/// One filled rectangle of a frame, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Band {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Anything a frame can be painted onto.
pub trait Surface {
    fn dimensions(&self) -> (u32, u32);
    /// Fill a rectangle opaquely. Parts outside the surface are ignored.
    fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>);
}

impl Surface for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        let (img_w, img_h) = (self.width(), self.height());
        let x0 = x.min(img_w) as usize;
        let x1 = x.saturating_add(w).min(img_w) as usize;
        let y0 = y.min(img_h) as usize;
        let y1 = y.saturating_add(h).min(img_h) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = img_w as usize * 4;
        let rows = &mut (**self)[y0 * stride..y1 * stride];
        rows.par_chunks_mut(stride).for_each(|row| {
            for px in row[x0 * 4..x1 * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&color.0);
            }
        });
    }
}

/// Exact (unrounded) band thickness: `min(w, h) / 2 * width%`.
pub fn frame_pixels(width_percent: u8, canvas_w: u32, canvas_h: u32) -> f32 {
    let max_frame = canvas_w.min(canvas_h) as f32 / 2.0;
    max_frame * (width_percent.min(100) as f32 / 100.0)
}

/// Rasterised band thickness. Capped at half the shorter side so opposite
/// bands can meet at the centre but never cross it.
pub fn band_thickness(width_percent: u8, canvas_w: u32, canvas_h: u32) -> u32 {
    let cap = canvas_w.min(canvas_h) / 2;
    (frame_pixels(width_percent, canvas_w, canvas_h).round() as u32).min(cap)
}

/// The rectangles a frame occupies on a `canvas_w x canvas_h` canvas.
/// Empty for a missing or zero-width frame.
pub fn frame_bands(frame: Option<&FrameData>, canvas_w: u32, canvas_h: u32) -> Vec<Band> {
    let Some(frame) = frame else { return Vec::new() };
    if frame.width == 0 {
        return Vec::new();
    }

    let t = band_thickness(frame.width, canvas_w, canvas_h);
    if t == 0 {
        return Vec::new();
    }

    let horizontal = [
        Band { x: 0, y: 0, width: canvas_w, height: t },
        Band { x: 0, y: canvas_h - t, width: canvas_w, height: t },
    ];
    let vertical = [
        Band { x: 0, y: 0, width: t, height: canvas_h },
        Band { x: canvas_w - t, y: 0, width: t, height: canvas_h },
    ];

    match frame.frame_type {
        FrameType::Horizontal => horizontal.to_vec(),
        FrameType::Vertical => vertical.to_vec(),
        FrameType::All => horizontal.into_iter().chain(vertical).collect(),
    }
}

/// Paint a frame onto `surface`, sized against the surface's own dimensions.
pub fn draw_frame<S: Surface + ?Sized>(surface: &mut S, frame: Option<&FrameData>) {
    let (w, h) = surface.dimensions();
    let Some(color) = frame.map(|f| f.color.rgba()) else { return };
    for band in frame_bands(frame, w, h) {
        surface.draw_rect(band.x, band.y, band.width, band.height, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(frame_type: FrameType, width: u8, color: FrameColor) -> FrameData {
        FrameData { frame_type, width, color }
    }

    fn checkerboard(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 { Rgba([200, 30, 30, 255]) } else { Rgba([30, 200, 30, 255]) }
        })
    }

    #[test]
    fn zero_or_missing_frame_has_no_bands() {
        assert!(frame_bands(None, 100, 100).is_empty());
        assert!(frame_bands(Some(&spec(FrameType::All, 0, FrameColor::Black)), 100, 100).is_empty());
    }

    #[test]
    fn horizontal_bands_span_full_width() {
        let bands = frame_bands(Some(&spec(FrameType::Horizontal, 20, FrameColor::White)), 300, 200);
        // min(300, 200) / 2 * 0.2 = 20
        assert_eq!(
            bands,
            vec![
                Band { x: 0, y: 0, width: 300, height: 20 },
                Band { x: 0, y: 180, width: 300, height: 20 },
            ]
        );
    }

    #[test]
    fn vertical_bands_span_full_height() {
        let bands = frame_bands(Some(&spec(FrameType::Vertical, 50, FrameColor::White)), 300, 200);
        assert_eq!(
            bands,
            vec![
                Band { x: 0, y: 0, width: 50, height: 200 },
                Band { x: 250, y: 0, width: 50, height: 200 },
            ]
        );
    }

    #[test]
    fn all_draws_four_bands() {
        let bands = frame_bands(Some(&spec(FrameType::All, 50, FrameColor::Black)), 400, 400);
        assert_eq!(bands.len(), 4);
        assert!(bands.iter().all(|b| b.width == 100 || b.height == 100));
    }

    #[test]
    fn full_width_never_crosses_centre() {
        for (w, h) in [(400, 400), (5, 9), (9, 5), (1, 1), (301, 777)] {
            let exact = frame_pixels(100, w, h);
            assert!(exact <= w.min(h) as f32 / 2.0);
            let t = band_thickness(100, w, h);
            assert!(t * 2 <= w.min(h), "{w}x{h}: {t}");
        }
    }

    #[test]
    fn drawing_is_idempotent() {
        let frame = spec(FrameType::All, 30, FrameColor::White);
        let mut once = checkerboard(64, 48);
        draw_frame(&mut once, Some(&frame));

        let mut twice = checkerboard(64, 48);
        draw_frame(&mut twice, Some(&frame));
        draw_frame(&mut twice, Some(&frame));

        assert_eq!(once.as_raw(), twice.as_raw());
    }

    #[test]
    fn draw_leaves_interior_untouched() {
        let mut img = checkerboard(40, 40);
        let original = img.clone();
        draw_frame(&mut img, Some(&spec(FrameType::Horizontal, 50, FrameColor::Black)));

        // t = 20 / 2 * 0.5 = 10
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(39, 9), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(20, 30), Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(20, 10), original.get_pixel(20, 10));
        assert_eq!(img.get_pixel(0, 29), original.get_pixel(0, 29));
    }

    #[test]
    fn draw_rect_clips_to_surface() {
        let mut img = RgbaImage::new(10, 10);
        img.draw_rect(8, 8, 50, 50, Rgba([1, 2, 3, 255]));
        assert_eq!(*img.get_pixel(9, 9), Rgba([1, 2, 3, 255]));
        assert_eq!(*img.get_pixel(7, 7), Rgba([0, 0, 0, 0]));
        img.draw_rect(20, 20, 5, 5, Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn parse_names() {
        assert_eq!(FrameType::parse("ALL"), Some(FrameType::All));
        assert_eq!(FrameType::parse("diagonal"), None);
        assert_eq!(FrameColor::parse("black"), Some(FrameColor::Black));
        assert_eq!(FrameColor::parse("red"), None);
    }
}
