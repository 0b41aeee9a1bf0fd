//! Image candidates extracted from rendered page content

use crate::names::normalize_file_name;
use serde::{Deserialize, Serialize};

/// One image reference found on a page
///
/// Produced by the rendering pipeline in on-page appearance order. The
/// index of a candidate in that sequence is its scoring position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    /// File name in database-key form (e.g. `Foo_bar.jpg`)
    pub file_name: String,
    /// Displayed width, set only when the image is shown outside a gallery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone_width: Option<u32>,
    /// Original file width in pixels
    #[serde(default)]
    pub full_width: u32,
    /// Original file height in pixels
    #[serde(default)]
    pub full_height: u32,
}

impl ImageCandidate {
    /// Candidate displayed directly on the page
    pub fn standalone(file_name: impl Into<String>, width: u32, full_width: u32, full_height: u32) -> Self {
        Self {
            file_name: file_name.into(),
            standalone_width: Some(width),
            full_width,
            full_height,
        }
    }

    /// Candidate displayed inside a gallery
    pub fn gallery(file_name: impl Into<String>, full_width: u32, full_height: u32) -> Self {
        Self {
            file_name: file_name.into(),
            standalone_width: None,
            full_width,
            full_height,
        }
    }

    /// File name in database-key form, as denylist entries are stored
    pub fn key(&self) -> String {
        normalize_file_name(&self.file_name)
    }

    /// Width used for scoring against the standalone table, if any
    ///
    /// A zero standalone width falls back to gallery scoring.
    pub fn effective_standalone_width(&self) -> Option<u32> {
        self.standalone_width.filter(|w| *w != 0)
    }

    /// `floor(width / height * 10)`, or 0 when either dimension is missing
    pub fn aspect_ratio_tenths(&self) -> u64 {
        if self.full_width == 0 || self.full_height == 0 {
            return 0;
        }
        (self.full_width as u64 * 10) / self.full_height as u64
    }
}
