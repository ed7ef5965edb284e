// ============================================================================
// EXPORT COMPOSITOR — pristine source + edit history -> finished image
// ============================================================================
//
// Always starts from the untouched original so preview approximations never
// compound into the exported file.

use image::RgbaImage;
use rayon::prelude::*;

use crate::components::history::{CropData, EditHistory};
use crate::error::{EditorError, Result};
use crate::ops::frame::draw_frame;

/// Upper bound on the output buffer, in bytes (RGBA8).
const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// Allocate a blank output buffer, or explain why the surface is unavailable.
pub fn create_canvas(width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(EditorError::CanvasContext(format!(
            "cannot create a {}x{} canvas",
            width, height
        )));
    }
    let bytes = width as u64 * height as u64 * 4;
    if bytes > MAX_CANVAS_BYTES {
        return Err(EditorError::CanvasContext(format!(
            "{}x{} canvas exceeds the {} MiB limit",
            width,
            height,
            MAX_CANVAS_BYTES >> 20
        )));
    }
    Ok(RgbaImage::new(width, height))
}

/// Copy `region` out of `source` into a fresh buffer at the origin.
pub fn extract_region(source: &RgbaImage, region: &CropData) -> Result<RgbaImage> {
    if !region.fits_within(source.width(), source.height()) {
        return Err(EditorError::Geometry(format!(
            "crop {}x{}+{}+{} lies outside the {}x{} source",
            region.width,
            region.height,
            region.x,
            region.y,
            source.width(),
            source.height()
        )));
    }

    let mut out = create_canvas(region.width, region.height)?;
    let src_stride = source.width() as usize * 4;
    let dst_stride = region.width as usize * 4;
    let x0 = region.x as usize * 4;
    let y0 = region.y as usize;
    let src = source.as_raw();

    out.par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(row, dst)| {
            let start = (y0 + row) * src_stride + x0;
            dst.copy_from_slice(&src[start..start + dst_stride]);
        });

    Ok(out)
}

/// Replay the history against the original source.
///
/// 1. Output size is the crop size, or the full source without a crop.
/// 2. The crop region (or whole source) is copied unscaled to `(0, 0)`.
/// 3. The frame is drawn on top, sized against the output dimensions.
pub fn compose(source: &RgbaImage, history: &EditHistory) -> Result<RgbaImage> {
    let mut out = match &history.crop {
        Some(crop) => extract_region(source, crop)?,
        None => {
            let mut full = create_canvas(source.width(), source.height())?;
            full.copy_from_slice(source.as_raw());
            full
        }
    };

    draw_frame(&mut out, history.frame.as_ref());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::frame::{FrameColor, FrameData, FrameType};
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]))
    }

    #[test]
    fn no_edits_returns_source_unchanged() {
        let src = gradient(37, 21);
        let out = compose(&src, &EditHistory::default()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn crop_copies_the_right_pixels() {
        let src = gradient(300, 200);
        let mut history = EditHistory::new();
        history.record_crop(CropData { x: 10, y: 20, width: 50, height: 40 });

        let out = compose(&src, &history).unwrap();
        assert_eq!(out.dimensions(), (50, 40));
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(10, 20));
        assert_eq!(out.get_pixel(49, 39), src.get_pixel(59, 59));
    }

    #[test]
    fn frame_is_sized_against_cropped_canvas() {
        let src = gradient(1000, 2000);
        let mut history = EditHistory::new();
        history.record_crop(CropData { x: 100, y: 100, width: 400, height: 400 });
        history.record_frame(Some(FrameData { frame_type: FrameType::All, width: 50, color: FrameColor::Black }));

        let out = compose(&src, &history).unwrap();
        assert_eq!(out.dimensions(), (400, 400));

        let black = Rgba([0, 0, 0, 255]);
        assert_eq!(*out.get_pixel(99, 200), black);
        assert_eq!(*out.get_pixel(300, 200), black);
        assert_eq!(*out.get_pixel(200, 99), black);
        assert_eq!(*out.get_pixel(200, 300), black);
        // 200x200 uncovered centre
        assert_eq!(out.get_pixel(100, 100), src.get_pixel(200, 200));
        assert_eq!(out.get_pixel(299, 299), src.get_pixel(399, 399));
    }

    #[test]
    fn crop_outside_source_is_a_geometry_error() {
        let src = gradient(50, 50);
        let mut history = EditHistory::new();
        history.record_crop(CropData { x: 40, y: 0, width: 20, height: 10 });
        assert!(matches!(compose(&src, &history), Err(EditorError::Geometry(_))));
    }

    #[test]
    fn empty_canvas_is_a_context_error() {
        assert!(matches!(create_canvas(0, 10), Err(EditorError::CanvasContext(_))));
        assert!(matches!(create_canvas(100_000, 100_000), Err(EditorError::CanvasContext(_))));
    }
}
