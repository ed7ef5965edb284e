//! Crop + frame editing for single images.
//!
//! A session holds the pristine source, the current crop/frame controls and
//! an [`EditHistory`](components::history::EditHistory). Export always replays
//! that history against the untouched original.

#[macro_use]
pub mod logger;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod session;

pub use components::history::{CropData, EditHistory};
pub use error::{EditorError, Result};
pub use ops::frame::{FrameColor, FrameData, FrameType};
pub use ops::geometry::{AspectRatio, DisplayGeometry};
pub use session::{EditMode, EditSession, EditorConfig, EditorObserver, ExportJob, ExportedImage};
