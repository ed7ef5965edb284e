use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::components::history::EditHistory;
use crate::error::{EditorError, Result};

/// JPEG quality used for exports unless configured otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Extension of every exported file.
pub const EXPORT_EXTENSION: &str = "jpg";

/// Suffix appended to the original stem.
const EXPORT_SUFFIX: &str = "-edited";

// ============================================================================
// INPUT — selected file and its decoded pixels
// ============================================================================

/// A file picked by the user, held in memory.
#[derive(Clone, Debug)]
pub struct FileHandle {
    pub name: String,
    /// MIME type as reported by the picker; `None` when unknown.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime, bytes }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_from_path(path);
        Ok(Self { name, mime, bytes })
    }
}

/// `image/*` MIME type for a known extension, `application/octet-stream`
/// for anything else.
fn mime_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    let mime = match ImageFormat::from_extension(ext) {
        Some(ImageFormat::Jpeg) => "image/jpeg".to_string(),
        Some(format) => format!("image/{}", format.extensions_str().first().copied().unwrap_or("unknown")),
        None => "application/octet-stream".to_string(),
    };
    Some(mime)
}

/// The pristine decoded original, shared with in-flight exports.
#[derive(Clone, Debug)]
pub struct SourceImage {
    name: String,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self { name: name.into(), pixels: Arc::new(pixels) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn shared_pixels(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.pixels)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Decode a selected file into RGBA pixels.
///
/// Files whose MIME type is not `image/*` are rejected before decoding.
pub fn decode_image(file: &FileHandle) -> Result<SourceImage> {
    if let Some(mime) = &file.mime
        && !mime.starts_with("image/")
    {
        return Err(EditorError::UnsupportedMediaType(mime.clone()));
    }

    let img = image::load_from_memory(&file.bytes).map_err(|e| EditorError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(EditorError::Decode(format!("'{}' has no pixels", file.name)));
    }

    Ok(SourceImage::new(file.name.clone(), rgba))
}

// ============================================================================
// OUTPUT — encoding, naming, delivery
// ============================================================================

/// Encode as JPEG at `quality` (1-100). Alpha is discarded.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder.encode(
            rgb_image.as_raw(),
            rgb_image.width(),
            rgb_image.height(),
            image::ColorType::Rgb8,
        )?;
    }
    Ok(bytes)
}

/// `photo.png` -> `photo-edited.jpg`. Only the last extension is stripped.
pub fn export_filename(original_name: &str) -> String {
    let stem = match original_name.rfind('.') {
        Some(0) | None => original_name,
        Some(idx) => &original_name[..idx],
    };
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{}{}.{}", stem, EXPORT_SUFFIX, EXPORT_EXTENSION)
}

/// Receives finished exports (the browser download, a file on disk, ...).
pub trait ExportSink {
    fn deliver(&mut self, bytes: &[u8], filename: &str) -> Result<()>;
}

/// Writes exports into a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: Vec::new() }
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, bytes: &[u8], filename: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(bytes)?;
        writer.flush()?;
        self.written.push(path);
        Ok(())
    }
}

/// Keeps exports in memory. Handy for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, bytes: &[u8], filename: &str) -> Result<()> {
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Load an [`EditHistory`] from a JSON edit file.
pub fn load_edit_file(path: &Path) -> Result<EditHistory> {
    let json = fs::read_to_string(path)?;
    Ok(EditHistory::from_json(&json)?)
}
