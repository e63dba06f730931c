use crate::{EpisodeId, SubmitRequest, ThumbnailHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the creation request for a new job.
    SubmitJob {
        episode: EpisodeId,
        request: SubmitRequest,
    },
    /// Start the status poller for an accepted job.
    StartPolling { episode: EpisodeId, job_id: String },
    /// Cancel whatever poller is currently running.
    StopPolling,
    /// Release a thumbnail handle; a no-op if it was already released.
    ReleaseThumbnail { handle: ThumbnailHandle },
}
