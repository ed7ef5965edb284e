use serde::{Deserialize, Serialize};

use crate::ops::frame::FrameData;

// ============================================================================
// EDIT RECORDS
// ============================================================================

/// Crop rectangle in source-image pixels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropData {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropData {
    /// True when the rectangle lies entirely inside a `width x height` image
    /// and covers at least one pixel.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

// ============================================================================
// EDIT HISTORY - at most one crop and one frame, last write wins
// ============================================================================

/// The edits that get replayed against the pristine source at export time.
///
/// Each field is replaced wholesale; successive crops are never merged.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct EditHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameData>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_crop(&mut self, data: CropData) {
        self.crop = Some(data);
    }

    /// Replace the frame. A zero-width frame is the same as no frame.
    pub fn record_frame(&mut self, data: Option<FrameData>) {
        self.frame = data.filter(|f| f.width > 0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none() && self.frame.is_none()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut history: Self = serde_json::from_str(json)?;
        // Route through the setter so a width of 0 is normalised away
        let frame = history.frame;
        history.record_frame(frame);
        Ok(history)
    }
}
