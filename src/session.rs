use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::components::history::{CropData, EditHistory};
use crate::components::selection::CropSelection;
use crate::error::{EditorError, Result};
use crate::io::{self, DEFAULT_JPEG_QUALITY, ExportSink, FileHandle, SourceImage};
use crate::ops::compositor;
use crate::ops::frame::{FrameColor, FrameData, FrameType};
use crate::ops::geometry::{AspectRatio, DisplayGeometry, compute_display_geometry, to_source_coordinates};
use crate::ops::render::{self, DrawCommand};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tunables for one editing session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorConfig {
    /// Bounding box of the on-screen canvas.
    pub max_display_width: f32,
    pub max_display_height: f32,
    pub jpeg_quality: u8,
    /// Smallest side a crop selection may be resized to, in display px.
    pub min_selection_size: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_display_width: 320.0,
            max_display_height: 380.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            min_selection_size: 20.0,
        }
    }
}

// ============================================================================
// OBSERVER - notifications for whatever UI sits on top
// ============================================================================

pub trait EditorObserver {
    /// A new source was decoded, or a crop changed the active canvas.
    fn on_image_loaded(&mut self, _geometry: &DisplayGeometry) {}
    fn on_history_changed(&mut self, _history: &EditHistory) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Frame,
    Trimming,
}

// ============================================================================
// EXPORT JOB - detached snapshot of source + history
// ============================================================================

/// Holds the session's saving flag; clears it when the last job clone is
/// dropped, including during a panic on a worker thread.
#[derive(Debug)]
struct SavingGuard(Arc<AtomicBool>);

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything needed to produce the final file, independent of the session.
/// `Send`, so it can run on a worker while the session stays responsive.
/// The session refuses new exports until every clone of the job is gone.
#[derive(Clone, Debug)]
pub struct ExportJob {
    pixels: Arc<RgbaImage>,
    history: EditHistory,
    filename: String,
    quality: u8,
    _saving: Arc<SavingGuard>,
}

/// A finished, encoded export.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportJob {
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Composite and encode. No partial output on failure.
    pub fn run(&self) -> Result<ExportedImage> {
        let composed = compositor::compose(&self.pixels, &self.history)?;
        let bytes = io::encode_jpeg(&composed, self.quality)?;
        Ok(ExportedImage {
            filename: self.filename.clone(),
            width: composed.width(),
            height: composed.height(),
            bytes,
        })
    }

    /// Run and hand the result to `sink`.
    pub fn run_into(&self, sink: &mut dyn ExportSink) -> Result<ExportedImage> {
        let exported = self.run()?;
        sink.deliver(&exported.bytes, &exported.filename)?;
        Ok(exported)
    }
}

// ============================================================================
// EDIT SESSION
// ============================================================================

/// All editing state for the currently loaded image.
pub struct EditSession {
    config: EditorConfig,
    source: Option<SourceImage>,
    /// Geometry of the active canvas (the applied crop, or the full source).
    geometry: Option<DisplayGeometry>,
    /// Region of the source shown on the active canvas.
    active_region: Option<CropData>,
    history: EditHistory,
    mode: EditMode,
    frame_type: FrameType,
    frame_width: u8,
    frame_color: FrameColor,
    aspect_ratio: AspectRatio,
    selection: Option<CropSelection>,
    is_saving: Arc<AtomicBool>,
    observer: Option<Box<dyn EditorObserver>>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .field("geometry", &self.geometry)
            .field("history", &self.history)
            .field("mode", &self.mode)
            .field("is_saving", &self.is_saving())
            .finish()
    }
}

impl EditSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            source: None,
            geometry: None,
            active_region: None,
            history: EditHistory::default(),
            mode: EditMode::Frame,
            frame_type: FrameType::default(),
            frame_width: 0,
            frame_color: FrameColor::default(),
            aspect_ratio: AspectRatio::default(),
            selection: None,
            is_saving: Arc::new(AtomicBool::new(false)),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn EditorObserver>) {
        self.observer = Some(observer);
    }

    // -- Accessors -------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn geometry(&self) -> Option<&DisplayGeometry> {
        self.geometry.as_ref()
    }

    pub fn active_region(&self) -> Option<CropData> {
        self.active_region
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// The frame currently in effect (`None` at width 0).
    pub fn frame(&self) -> Option<FrameData> {
        self.history.frame
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn frame_width(&self) -> u8 {
        self.frame_width
    }

    pub fn frame_color(&self) -> FrameColor {
        self.frame_color
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn selection(&self) -> Option<&CropSelection> {
        self.selection.as_ref()
    }

    pub fn is_trimming(&self) -> bool {
        self.selection.is_some()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving.load(Ordering::Acquire)
    }

    // -- Source lifecycle ------------------------------------------------

    /// Decode `file` and make it the new source. Every piece of derived
    /// state is reset. On failure the session is left untouched.
    pub fn load(&mut self, file: &FileHandle) -> Result<()> {
        let source = io::decode_image(file)?;
        let (w, h) = source.dimensions();
        log_info!("Loaded '{}' ({}x{})", source.name(), w, h);

        self.reset_edit_state();
        self.active_region = Some(CropData { x: 0, y: 0, width: w, height: h });
        self.geometry = Some(self.fit_display(w, h));
        self.source = Some(source);

        self.notify_image_loaded();
        self.notify_history();
        Ok(())
    }

    /// Drop the source and all edits.
    pub fn unload(&mut self) {
        if self.source.take().is_some() {
            log_info!("Source image removed");
        }
        self.reset_edit_state();
        self.notify_history();
    }

    fn reset_edit_state(&mut self) {
        self.geometry = None;
        self.active_region = None;
        self.history.reset();
        self.mode = EditMode::Frame;
        self.frame_type = FrameType::default();
        self.frame_width = 0;
        self.frame_color = FrameColor::default();
        self.selection = None;
    }

    fn fit_display(&self, w: u32, h: u32) -> DisplayGeometry {
        compute_display_geometry(w, h, self.config.max_display_width, self.config.max_display_height)
    }

    // -- Frame controls --------------------------------------------------

    pub fn set_frame_type(&mut self, frame_type: FrameType) {
        self.frame_type = frame_type;
        self.sync_frame();
    }

    /// Slider value, clamped to 0..=100.
    pub fn set_frame_width(&mut self, width: u8) {
        self.frame_width = width.min(100);
        self.sync_frame();
    }

    pub fn set_frame_color(&mut self, color: FrameColor) {
        self.frame_color = color;
        self.sync_frame();
    }

    /// Set all three frame controls at once.
    pub fn set_frame(&mut self, frame: FrameData) {
        self.frame_type = frame.frame_type;
        self.frame_width = frame.width.min(100);
        self.frame_color = frame.color;
        self.sync_frame();
    }

    fn sync_frame(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.history.record_frame(Some(FrameData {
            frame_type: self.frame_type,
            width: self.frame_width,
            color: self.frame_color,
        }));
        self.notify_history();
    }

    // -- Trimming --------------------------------------------------------

    pub fn set_mode(&mut self, mode: EditMode) -> Result<()> {
        match mode {
            EditMode::Trimming => self.start_trimming(),
            EditMode::Frame => {
                self.cancel_trimming();
                Ok(())
            }
        }
    }

    /// Place a centred selection of the current aspect ratio on the active canvas.
    pub fn start_trimming(&mut self) -> Result<()> {
        let geometry = self.geometry.ok_or(EditorError::NoImage)?;
        self.selection = Some(CropSelection::fitted(
            self.aspect_ratio,
            geometry.display_width,
            geometry.display_height,
            self.config.min_selection_size,
        ));
        self.mode = EditMode::Trimming;
        Ok(())
    }

    pub fn cancel_trimming(&mut self) {
        self.selection = None;
        self.mode = EditMode::Frame;
    }

    /// Change the ratio; an active selection is refitted and recentred.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = ratio;
        if let Some(selection) = self.selection.as_mut() {
            selection.refit(ratio);
        }
    }

    pub fn move_selection(&mut self, left: f32, top: f32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.move_to(left, top);
        }
    }

    pub fn resize_selection(&mut self, scale_x: f32, scale_y: f32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.scale_to(scale_x, scale_y);
        }
    }

    /// Commit the selection as the crop.
    ///
    /// The selection lives in display space of the active canvas, which may
    /// itself be an earlier crop; the result is always in source pixels.
    pub fn apply_crop(&mut self) -> Result<CropData> {
        let selection = self
            .selection
            .ok_or_else(|| EditorError::Geometry("no active crop selection".to_string()))?;
        let geometry = self.geometry.ok_or(EditorError::NoImage)?;
        let region = self.active_region.ok_or(EditorError::NoImage)?;

        let local = to_source_coordinates(selection.rect(), &geometry, (0.0, 0.0));
        let crop = CropData {
            x: region.x + local.x,
            y: region.y + local.y,
            width: local.width,
            height: local.height,
        };

        self.selection = None;
        self.mode = EditMode::Frame;
        self.commit_crop(crop)?;
        Ok(crop)
    }

    /// Record a crop given directly in source pixels.
    pub fn record_crop(&mut self, crop: CropData) -> Result<()> {
        self.selection = None;
        self.mode = EditMode::Frame;
        self.commit_crop(crop)
    }

    fn commit_crop(&mut self, crop: CropData) -> Result<()> {
        let source = self.source.as_ref().ok_or(EditorError::NoImage)?;
        let (w, h) = source.dimensions();
        if !crop.fits_within(w, h) {
            return Err(EditorError::Geometry(format!(
                "crop {}x{}+{}+{} lies outside the {}x{} source",
                crop.width, crop.height, crop.x, crop.y, w, h
            )));
        }

        log_info!("Crop applied: {}x{} at ({}, {})", crop.width, crop.height, crop.x, crop.y);
        self.history.record_crop(crop);
        self.active_region = Some(crop);
        self.geometry = Some(self.fit_display(crop.width, crop.height));

        self.notify_image_loaded();
        self.notify_history();
        Ok(())
    }

    // -- Preview ---------------------------------------------------------

    pub fn render(&self) -> Vec<DrawCommand> {
        render::render(self)
    }

    /// Rasterise the preview. `None` when nothing is loaded.
    pub fn render_preview(&self) -> Result<Option<RgbaImage>> {
        let Some(source) = self.source.as_ref() else { return Ok(None) };
        render::paint(&self.render(), source.pixels())
    }

    // -- Export ----------------------------------------------------------

    /// Snapshot the source and history for export. `Ok(None)` while another
    /// job is still alive; the request is dropped, not queued.
    pub fn begin_export(&mut self) -> Result<Option<ExportJob>> {
        let source = self.source.as_ref().ok_or(EditorError::NoImage)?;
        if self.is_saving.swap(true, Ordering::AcqRel) {
            log_warn!("Export requested while another is in progress; ignoring");
            return Ok(None);
        }

        Ok(Some(ExportJob {
            pixels: source.shared_pixels(),
            history: self.history,
            filename: io::export_filename(source.name()),
            quality: self.config.jpeg_quality,
            _saving: Arc::new(SavingGuard(Arc::clone(&self.is_saving))),
        }))
    }

    /// Hand a finished job back. Dropping the job anywhere has the same
    /// effect once its last clone is gone.
    pub fn finish_export(&mut self, job: ExportJob) {
        drop(job);
    }

    /// Composite, encode, and deliver in one go.
    pub fn export(&mut self, sink: &mut dyn ExportSink) -> Result<Option<ExportedImage>> {
        let Some(job) = self.begin_export()? else { return Ok(None) };
        let result = job.run_into(sink);
        let filename = job.filename().to_string();
        self.finish_export(job);

        match result {
            Ok(exported) => {
                log_info!(
                    "Exported '{}' ({}x{}, {} bytes)",
                    exported.filename,
                    exported.width,
                    exported.height,
                    exported.bytes.len()
                );
                Ok(Some(exported))
            }
            Err(e) => {
                log_err!("Export of '{}' failed: {}", filename, e);
                Err(e)
            }
        }
    }

    // -- Notifications ---------------------------------------------------

    fn notify_image_loaded(&mut self) {
        if let (Some(observer), Some(geometry)) = (self.observer.as_mut(), self.geometry.as_ref()) {
            observer.on_image_loaded(geometry);
        }
    }

    fn notify_history(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_history_changed(&self.history);
        }
    }
}
