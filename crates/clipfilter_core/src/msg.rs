use crate::{EpisodeId, FilterKey, ThumbnailHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the source video URL.
    SourceUrlChanged(String),
    /// User picked a filter.
    FilterSelected(FilterKey),
    /// User submitted the form.
    SubmitClicked,
    /// Backend accepted the job and assigned an identifier.
    SubmitAccepted { episode: EpisodeId, job_id: String },
    /// Backend processed the job synchronously; the artifact is ready.
    SubmitCompleted {
        episode: EpisodeId,
        job_id: String,
        artifact_url: String,
    },
    /// Submission request failed; the attempt is over.
    SubmitFailed { episode: EpisodeId, message: String },
    /// A status snapshot reported frame counters.
    StatusProgress {
        episode: EpisodeId,
        frames_done: u64,
        total_frames: u64,
    },
    /// A thumbnail fetch succeeded and its bytes now live behind `handle`.
    ThumbnailAcquired {
        episode: EpisodeId,
        handle: ThumbnailHandle,
    },
    /// A thumbnail fetch was attempted without success.
    ThumbnailMissed { episode: EpisodeId },
    /// Backend reported the job completed.
    JobCompleted {
        episode: EpisodeId,
        artifact_url: String,
    },
    /// Backend reported the job failed.
    JobFailed { episode: EpisodeId, message: String },
    /// User asked to start over.
    ResetClicked,
}
