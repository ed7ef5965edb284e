// ============================================================================
// photoframe CLI — crop and frame images without a UI
// ============================================================================
//
// Usage examples:
//   photoframe -i photo.jpg --frame all --frame-width 50 --frame-color black
//   photoframe -i photo.png --crop 100,100,400,400 --output-dir out/
//   photoframe -i shots/*.jpg --aspect 16:9 --frame horizontal --frame-width 10
//   photoframe -i photo.jpg --edits edits.json -q 90
//
// Every input goes through the same session API a UI would drive: load,
// set edit parameters, export. Output is `{stem}-edited.jpg`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::components::history::{CropData, EditHistory};
use crate::error::{EditorError, Result};
use crate::io::{DEFAULT_JPEG_QUALITY, DirectorySink, FileHandle, load_edit_file};
use crate::logger::Level;
use crate::ops::frame::{FrameColor, FrameData, FrameType};
use crate::ops::geometry::AspectRatio;
use crate::session::{EditSession, EditorConfig, ExportedImage};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Crop images and add a solid border.
#[derive(Parser, Debug)]
#[command(
    name = "photoframe",
    about = "Crop images and add a solid-color frame",
    long_about = "Apply a crop and/or a white or black frame to images and export\n\
                  them as JPEG files named <stem>-edited.jpg.\n\n\
                  Example:\n  \
                  photoframe -i photo.jpg --crop 100,100,400,400 --frame all --frame-width 50"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Crop rectangle in source pixels: X,Y,WIDTH,HEIGHT.
    #[arg(long, value_name = "X,Y,W,H", conflicts_with = "aspect")]
    pub crop: Option<String>,

    /// Crop to the largest centred rectangle of this ratio: 1:1, 16:9, 5:4, 7:5.
    #[arg(long, value_name = "RATIO")]
    pub aspect: Option<String>,

    /// Frame placement: horizontal (default), vertical, all.
    #[arg(long, value_name = "TYPE")]
    pub frame: Option<String>,

    /// Frame thickness as a percentage (0-100) of half the shorter side. 0 disables the frame.
    #[arg(long, value_name = "0-100")]
    pub frame_width: Option<u8>,

    /// Frame color: white (default), black.
    #[arg(long, value_name = "COLOR")]
    pub frame_color: Option<String>,

    /// JSON edit file ({"crop": {...}, "frame": {...}}). Each flag given on
    /// the command line overrides the matching field, one at a time.
    #[arg(long, value_name = "FILE.json")]
    pub edits: Option<PathBuf>,

    /// Output directory. Defaults to each input's own directory.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY, value_name = "1-100")]
    pub quality: u8,

    /// Print the applied edits and per-file timing.
    #[arg(short, long)]
    pub verbose: bool,

    /// Run log file. Defaults to PhotoFrame/photoframe.log in the user data directory.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Least severe level written to the run log.
    #[arg(long, value_enum, default_value_t = Level::Info, value_name = "LEVEL")]
    pub log_level: Level,
}

/// Edit parameters shared by every input, resolved once up front.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EditPlan {
    crop: Option<CropData>,
    aspect: Option<AspectRatio>,
    frame: Option<FrameData>,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    let plan = match build_plan(&args) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = EditorConfig {
        jpeg_quality: args.quality.clamp(1, 100),
        ..EditorConfig::default()
    };

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();
        let out_dir = output_dir_for(input_path, args.output_dir.as_deref());

        match run_one(input_path, &out_dir, &plan, config, args.verbose) {
            Ok(exported) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({}x{}, {:.0}ms)",
                        out_dir.join(&exported.filename).display(),
                        exported.width,
                        exported.height,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    out_dir: &Path,
    plan: &EditPlan,
    config: EditorConfig,
    verbose: bool,
) -> Result<ExportedImage> {
    // -- Step 1: Load ----------------------------------------------------
    let file = FileHandle::from_path(input)?;
    let mut session = EditSession::new(config);
    session.load(&file)?;

    // -- Step 2: Crop ----------------------------------------------------
    if let Some(crop) = plan.crop {
        session.record_crop(crop)?;
    } else if let Some(ratio) = plan.aspect {
        session.set_aspect_ratio(ratio);
        session.start_trimming()?;
        session.apply_crop()?;
    }

    // -- Step 3: Frame ---------------------------------------------------
    if let Some(frame) = plan.frame {
        session.set_frame(frame);
    }

    if verbose {
        println!("  edits: {}", session.history().to_json()?);
    }

    // -- Step 4: Export --------------------------------------------------
    let mut sink = DirectorySink::new(out_dir);
    session
        .export(&mut sink)?
        .ok_or(EditorError::ExportInProgress)
}

// ============================================================================
// Helpers
// ============================================================================

/// Merge the edit file (if any) with the command-line flags.
fn build_plan(args: &CliArgs) -> Result<EditPlan> {
    let base = match &args.edits {
        Some(path) => load_edit_file(path)?,
        None => EditHistory::default(),
    };

    let crop = match args.crop.as_deref() {
        Some(s) => Some(parse_crop(s)?),
        None if args.aspect.is_none() => base.crop,
        None => None,
    };

    let aspect = match args.aspect.as_deref() {
        Some(s) => Some(
            AspectRatio::parse(s)
                .ok_or_else(|| EditorError::InvalidArgument(format!("unknown aspect ratio '{}'", s)))?,
        ),
        None => None,
    };

    let frame_type = match args.frame.as_deref() {
        Some(s) => Some(
            FrameType::parse(s)
                .ok_or_else(|| EditorError::InvalidArgument(format!("unknown frame type '{}'", s)))?,
        ),
        None => None,
    };
    let color = match args.frame_color.as_deref() {
        Some(s) => Some(
            FrameColor::parse(s)
                .ok_or_else(|| EditorError::InvalidArgument(format!("unknown frame color '{}'", s)))?,
        ),
        None => None,
    };

    // Flags are laid over the edit file's frame field by field
    let frame = if frame_type.is_none() && color.is_none() && args.frame_width.is_none() {
        base.frame
    } else {
        let mut frame = base.frame.unwrap_or(FrameData {
            frame_type: FrameType::default(),
            width: 0,
            color: FrameColor::default(),
        });
        if let Some(t) = frame_type {
            frame.frame_type = t;
        }
        if let Some(c) = color {
            frame.color = c;
        }
        if let Some(w) = args.frame_width {
            frame.width = w.min(100);
        }
        (frame.width > 0).then_some(frame)
    };

    Ok(EditPlan { crop, aspect, frame })
}

/// `"X,Y,W,H"` -> [`CropData`].
fn parse_crop(s: &str) -> Result<CropData> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| EditorError::InvalidArgument(format!("invalid crop '{}': {}", s, e)))?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(CropData { x: *x, y: *y, width: *width, height: *height }),
        _ => Err(EditorError::InvalidArgument(format!("crop '{}' needs exactly X,Y,W,H", s))),
    }
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// `--output-dir` when given, otherwise the input's own directory.
fn output_dir_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = output_dir {
        return dir.to_path_buf();
    }
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
