//! JSON bodies exchanged with the processing backend.
use serde::{Deserialize, Deserializer};

pub(crate) const COMPLETED_MARKER: &str = "completed";
const PROCESSING_MARKER: &str = "processing";

/// Job status as reported by `GET /status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum JobStatus {
    Processing,
    Completed,
    /// Anything else, including a missing status.
    Unrecognized(String),
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Unrecognized(String::new())
    }
}

impl From<Option<String>> for JobStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some(COMPLETED_MARKER) => JobStatus::Completed,
            Some(PROCESSING_MARKER) => JobStatus::Processing,
            _ => JobStatus::Unrecognized(raw.unwrap_or_default()),
        }
    }
}

/// One decoded status response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "frame_count")]
    pub progress: Option<u64>,
    #[serde(default, deserialize_with = "frame_count")]
    pub total_frames: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusSnapshot {
    pub fn frames_done(&self) -> u64 {
        self.progress.unwrap_or(0)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames.unwrap_or(0)
    }

    /// Error reported by the backend; an empty message counts as none.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Accepts any JSON number as a frame count. Fractions are truncated and
/// negative values read as 0.
fn frame_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(raw.map(|number| {
        number.as_u64().unwrap_or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite() && *value > 0.0)
                .map_or(0, |value| value as u64)
        })
    }))
}

/// Status response together with the HTTP status it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub http_status: u16,
    pub snapshot: StatusSnapshot,
}

impl StatusReply {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// Message for a reply that ends the job, or `None` to keep polling.
    pub fn failure(&self) -> Option<String> {
        match self.snapshot.error_message() {
            Some(message) => Some(message.to_string()),
            None if !self.is_ok() => Some("Processing failed".to_string()),
            None => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PollingSubmitBody {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncSubmitBody {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
