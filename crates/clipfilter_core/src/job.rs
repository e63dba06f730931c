use serde::{Deserialize, Serialize};

/// Monotonic counter identifying one submit/reset episode.
///
/// Every asynchronous result carries the episode that issued it so results
/// from an abandoned episode can be recognised and dropped.
pub type EpisodeId = u64;

/// Filters the backend knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterKey {
    #[serde(rename = "grayscale")]
    Grayscale,
    #[serde(rename = "sepia")]
    Sepia,
    #[default]
    #[serde(rename = "no transform")]
    NoTransform,
}

impl FilterKey {
    pub const ALL: [FilterKey; 3] = [FilterKey::Grayscale, FilterKey::Sepia, FilterKey::NoTransform];

    /// Wire name sent to the backend.
    pub fn key(self) -> &'static str {
        match self {
            FilterKey::Grayscale => "grayscale",
            FilterKey::Sepia => "sepia",
            FilterKey::NoTransform => "no transform",
        }
    }

    /// Human-readable label for selection lists.
    pub fn label(self) -> &'static str {
        match self {
            FilterKey::Grayscale => "Grayscale",
            FilterKey::Sepia => "Sepia",
            FilterKey::NoTransform => "No filter",
        }
    }
}

/// Body of a submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub video_url: String,
    pub filter: FilterKey,
}

/// One accepted processing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub source_url: String,
    pub filter: FilterKey,
}

/// Locally-addressable handle to fetched thumbnail bytes.
///
/// The bytes themselves are owned by the engine's resource manager; the
/// handle only names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailHandle {
    pub id: u64,
    pub url: String,
}

impl ThumbnailHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            url: format!("blob:clipfilter/{id}"),
        }
    }
}
