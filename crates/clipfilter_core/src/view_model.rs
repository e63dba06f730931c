use crate::{FilterKey, Stage, ThumbnailHandle};

/// Thumbnail preview status while processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailView {
    /// No fetch attempted yet.
    Preparing,
    /// At least one fetch attempted, none succeeded.
    Waiting,
    Ready(ThumbnailHandle),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stage: Stage,
    pub source_url: String,
    pub filter: FilterKey,
    pub submitting: bool,
    pub job_id: Option<String>,
    pub frames_done: u64,
    pub total_frames: u64,
    pub percent: u8,
    pub thumbnail: Option<ThumbnailView>,
    pub artifact_url: Option<String>,
    pub error: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    /// True once the preview has been fetched at least once, successful or not.
    pub fn thumbnail_attempted(&self) -> bool {
        matches!(
            self.thumbnail,
            Some(ThumbnailView::Waiting) | Some(ThumbnailView::Ready(_))
        )
    }
}
