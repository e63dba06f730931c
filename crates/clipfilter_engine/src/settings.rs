use std::time::Duration;

/// How the backend answers `POST /process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStrategy {
    /// `{job_id}`; progress is tracked by polling `/status/{job_id}`.
    #[default]
    Polling,
    /// `{path}`; the artifact is ready as soon as the request returns.
    Synchronous,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub base_url: String,
    /// Delay between status queries while the job is healthy.
    pub poll_interval: Duration,
    /// Delay after a status query failed at the transport level.
    pub backoff_interval: Duration,
    pub connect_timeout: Duration,
    /// Per-request deadline; `None` lets a stuck query wait until cancelled.
    pub request_timeout: Option<Duration>,
    /// Consecutive transport failures tolerated before the job is failed.
    /// `None` retries forever.
    pub max_transient_failures: Option<u32>,
    pub submission: SubmissionStrategy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            poll_interval: Duration::from_millis(700),
            backoff_interval: Duration::from_millis(1200),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_transient_failures: None,
            submission: SubmissionStrategy::Polling,
        }
    }
}

impl EngineSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("poll interval must be non-zero".to_string());
        }
        if self.backoff_interval <= self.poll_interval {
            return Err(format!(
                "backoff interval ({:?}) must exceed poll interval ({:?})",
                self.backoff_interval, self.poll_interval
            ));
        }
        Ok(())
    }
}
