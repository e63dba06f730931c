use std::fmt;

use bytes::Bytes;
use clipfilter_core::EpisodeId;

/// What a successful submission request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend queued the job; poll its status.
    Accepted { job_id: String },
    /// The backend processed the job before answering.
    Completed { job_id: String, artifact_url: String },
}

/// Something the status poller observed during one processing episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Progress {
        episode: EpisodeId,
        frames_done: u64,
        total_frames: u64,
    },
    ThumbnailFetched { episode: EpisodeId, bytes: Bytes },
    ThumbnailMissed { episode: EpisodeId },
    Completed {
        episode: EpisodeId,
        artifact_url: String,
    },
    Failed { episode: EpisodeId, message: String },
}

impl PollEvent {
    pub fn episode(&self) -> EpisodeId {
        match self {
            PollEvent::Progress { episode, .. }
            | PollEvent::ThumbnailFetched { episode, .. }
            | PollEvent::ThumbnailMissed { episode }
            | PollEvent::Completed { episode, .. }
            | PollEvent::Failed { episode, .. } => *episode,
        }
    }

    /// True for the last event a poller emits in an episode.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollEvent::Completed { .. } | PollEvent::Failed { .. })
    }
}

/// Short form for logs; thumbnail bytes are summarised by length.
impl fmt::Display for PollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollEvent::Progress {
                frames_done,
                total_frames,
                ..
            } => write!(f, "progress {frames_done}/{total_frames}"),
            PollEvent::ThumbnailFetched { bytes, .. } => {
                write!(f, "thumbnail ({} bytes)", bytes.len())
            }
            PollEvent::ThumbnailMissed { .. } => write!(f, "thumbnail miss"),
            PollEvent::Completed { artifact_url, .. } => write!(f, "completed at {artifact_url}"),
            PollEvent::Failed { message, .. } => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    Decode,
    MissingField(&'static str),
}

impl FailureKind {
    /// Failures the poller treats as transient and retries after backing off.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FailureKind::Network | FailureKind::Timeout | FailureKind::Decode
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::MissingField(field) => write!(f, "missing field {field}"),
        }
    }
}
