// ============================================================================
// PREVIEW RENDERING — session state -> draw commands -> display-sized buffer
// ============================================================================
//
// The preview is rebuilt from scratch on every state change, so a previous
// frame or selection overlay can never linger.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::components::history::CropData;
use crate::error::Result;
use crate::ops::compositor::{create_canvas, extract_region};
use crate::ops::frame::{Surface, frame_bands};
use crate::ops::geometry::Rect;
use crate::session::EditSession;

/// Translucent fill of the trimming rectangle.
const SELECTION_SHADE: Rgba<u8> = Rgba([0, 0, 0, 77]);
const SELECTION_BORDER: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Start a blank canvas of the given display size.
    Canvas { width: u32, height: u32 },
    /// Draw `region` of the source scaled to fill the canvas.
    Image { region: CropData },
    /// Opaque frame band, in canvas pixels.
    Fill { x: u32, y: u32, width: u32, height: u32, color: Rgba<u8> },
    /// The interactive crop rectangle, in canvas pixels.
    Selection { rect: Rect },
}

/// Describe the current preview. Pure; does not touch pixels.
pub fn render(session: &EditSession) -> Vec<DrawCommand> {
    let (Some(geometry), Some(region)) = (session.geometry(), session.active_region()) else {
        return Vec::new();
    };

    let width = (geometry.display_width.round() as u32).max(1);
    let height = (geometry.display_height.round() as u32).max(1);

    let mut commands = vec![DrawCommand::Canvas { width, height }, DrawCommand::Image { region }];

    let frame = session.frame();
    if let Some(f) = frame.as_ref() {
        let color = f.color.rgba();
        commands.extend(frame_bands(Some(f), width, height).into_iter().map(|b| DrawCommand::Fill {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            color,
        }));
    }

    if let Some(selection) = session.selection() {
        commands.push(DrawCommand::Selection { rect: selection.rect() });
    }

    commands
}

/// Rasterise `commands` against `source`.
pub fn paint(commands: &[DrawCommand], source: &RgbaImage) -> Result<Option<RgbaImage>> {
    let mut canvas: Option<RgbaImage> = None;

    for command in commands {
        match command {
            DrawCommand::Canvas { width, height } => {
                canvas = Some(create_canvas(*width, *height)?);
            }
            DrawCommand::Image { region } => {
                let Some(target) = canvas.as_mut() else { continue };
                let cropped = extract_region(source, region)?;
                let (w, h) = (target.width(), target.height());
                let scaled = if cropped.dimensions() == (w, h) {
                    cropped
                } else {
                    imageops::resize(&cropped, w, h, FilterType::Triangle)
                };
                imageops::replace(target, &scaled, 0, 0);
            }
            DrawCommand::Fill { x, y, width, height, color } => {
                if let Some(target) = canvas.as_mut() {
                    target.draw_rect(*x, *y, *width, *height, *color);
                }
            }
            DrawCommand::Selection { rect } => {
                if let Some(target) = canvas.as_mut() {
                    shade_selection(target, rect);
                }
            }
        }
    }

    Ok(canvas)
}

fn shade_selection(target: &mut RgbaImage, rect: &Rect) {
    let (w, h) = (target.width() as f32, target.height() as f32);
    let x0 = rect.x.max(0.0).round() as u32;
    let y0 = rect.y.max(0.0).round() as u32;
    let x1 = rect.right().min(w).round() as u32;
    let y1 = rect.bottom().min(h).round() as u32;
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            let edge = x == x0 || y == y0 || x + 1 == x1 || y + 1 == y1;
            let px = target.get_pixel_mut(x, y);
            if edge {
                *px = SELECTION_BORDER;
            } else {
                blend(px, SELECTION_SHADE);
            }
        }
    }
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src[3] as u32;
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
    }
}
