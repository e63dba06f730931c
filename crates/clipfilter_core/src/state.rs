use crate::view_model::{AppViewModel, ThumbnailView};
use crate::{percentage, EpisodeId, FilterKey, Job, SubmitRequest, ThumbnailHandle};

/// Coarse phase shown to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Processing,
    Done,
}

/// Everything that only exists while a job is being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingState {
    pub job: Job,
    pub frames_done: u64,
    pub total_frames: u64,
    pub thumbnail: Option<ThumbnailHandle>,
    pub thumbnail_attempted: bool,
}

/// Stage together with the data that is only valid in that stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Processing(ProcessingState),
    Done { job: Job, artifact_url: String },
}

impl Phase {
    pub fn stage(&self) -> Stage {
        match self {
            Phase::Idle => Stage::Idle,
            Phase::Processing(_) => Stage::Processing,
            Phase::Done { .. } => Stage::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    source_url: String,
    filter: FilterKey,
    phase: Phase,
    episode: EpisodeId,
    pending: Option<SubmitRequest>,
    error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with the submission form pre-filled.
    pub fn with_source_url(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let mut view = AppViewModel {
            stage: self.phase.stage(),
            source_url: self.source_url.clone(),
            filter: self.filter,
            submitting: self.pending.is_some(),
            error: self.error.clone(),
            dirty: self.dirty,
            ..AppViewModel::default()
        };
        match &self.phase {
            Phase::Idle => {}
            Phase::Processing(processing) => {
                view.job_id = Some(processing.job.id.clone());
                view.frames_done = processing.frames_done;
                view.total_frames = processing.total_frames;
                view.percent = percentage(processing.frames_done, processing.total_frames);
                view.thumbnail = Some(match &processing.thumbnail {
                    Some(handle) => ThumbnailView::Ready(handle.clone()),
                    None if processing.thumbnail_attempted => ThumbnailView::Waiting,
                    None => ThumbnailView::Preparing,
                });
            }
            Phase::Done { job, artifact_url } => {
                view.job_id = Some(job.id.clone());
                view.artifact_url = Some(artifact_url.clone());
                view.percent = 100;
            }
        }
        view
    }

    pub fn stage(&self) -> Stage {
        self.phase.stage()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn filter(&self) -> FilterKey {
        self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Thumbnail handle currently held by the processing phase, if any.
    pub fn thumbnail(&self) -> Option<&ThumbnailHandle> {
        match &self.phase {
            Phase::Processing(processing) => processing.thumbnail.as_ref(),
            _ => None,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    /// True when a poller result from `episode` may still be applied.
    pub fn accepts_poll_result(&self, episode: EpisodeId) -> bool {
        self.episode == episode && matches!(self.phase, Phase::Processing(_))
    }

    /// True when a submission result from `episode` may still be applied.
    pub fn accepts_submission_result(&self, episode: EpisodeId) -> bool {
        self.episode == episode && self.pending.is_some()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_source_url(&mut self, url: String) {
        if self.source_url != url {
            self.source_url = url;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_filter(&mut self, filter: FilterKey) {
        if self.filter != filter {
            self.filter = filter;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.mark_dirty();
    }

    /// Starts a new episode, returning to a clean idle phase.
    ///
    /// Returns the thumbnail handle the previous phase held, which the
    /// caller must release.
    pub(crate) fn begin_episode(&mut self) -> Option<ThumbnailHandle> {
        self.episode += 1;
        self.pending = None;
        self.error = None;
        self.mark_dirty();
        self.take_phase(Phase::Idle)
    }

    pub(crate) fn set_pending(&mut self, request: SubmitRequest) {
        self.pending = Some(request);
        self.mark_dirty();
    }

    /// Clears the outstanding submission, returning what was submitted.
    pub(crate) fn take_pending(&mut self) -> Option<SubmitRequest> {
        self.mark_dirty();
        self.pending.take()
    }

    /// Replaces the phase, returning any thumbnail handle the old phase held.
    pub(crate) fn take_phase(&mut self, next: Phase) -> Option<ThumbnailHandle> {
        self.mark_dirty();
        match std::mem::replace(&mut self.phase, next) {
            Phase::Processing(processing) => processing.thumbnail,
            _ => None,
        }
    }

    pub(crate) fn processing_mut(&mut self) -> Option<&mut ProcessingState> {
        match &mut self.phase {
            Phase::Processing(processing) => Some(processing),
            _ => None,
        }
    }
}
