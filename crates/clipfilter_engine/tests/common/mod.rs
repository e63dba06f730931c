#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use bytes::Bytes;
use clipfilter_core::SubmitRequest;
use clipfilter_engine::{
    Backend, BackendError, FailureKind, JobStatus, StatusReply, StatusSnapshot,
    SubmissionStrategy, SubmitOutcome,
};
use tokio::sync::Notify;
use tokio::time::Instant;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(clipfilter_logging::initialize_for_tests);
}

pub fn processing(done: u64, total: u64) -> Result<StatusReply, BackendError> {
    Ok(StatusReply {
        http_status: 200,
        snapshot: StatusSnapshot {
            status: JobStatus::Processing,
            progress: Some(done),
            total_frames: Some(total),
            error: None,
        },
    })
}

pub fn completed() -> Result<StatusReply, BackendError> {
    Ok(StatusReply {
        http_status: 200,
        snapshot: StatusSnapshot {
            status: JobStatus::Completed,
            ..StatusSnapshot::default()
        },
    })
}

pub fn job_error(message: &str) -> Result<StatusReply, BackendError> {
    Ok(StatusReply {
        http_status: 200,
        snapshot: StatusSnapshot {
            status: JobStatus::Processing,
            error: Some(message.to_string()),
            ..StatusSnapshot::default()
        },
    })
}

pub fn network_error() -> BackendError {
    BackendError {
        kind: FailureKind::Network,
        message: "connection refused".to_string(),
    }
}

pub fn not_found() -> BackendError {
    BackendError {
        kind: FailureKind::HttpStatus(404),
        message: "404 Not Found".to_string(),
    }
}

/// In-memory backend answering from scripted queues.
///
/// Once the status script runs out every query reports `processing 0/0`;
/// once the thumbnail script runs out every fetch is a 404.
pub struct ScriptedBackend {
    submit_result: Mutex<Option<Result<SubmitOutcome, BackendError>>>,
    statuses: Mutex<VecDeque<Result<StatusReply, BackendError>>>,
    thumbnails: Mutex<VecDeque<Result<Bytes, BackendError>>>,
    status_calls: Mutex<Vec<Instant>>,
    thumbnail_calls: AtomicUsize,
    /// When set, thumbnail fetches announce themselves and wait for release.
    hold_thumbnails: bool,
    /// When set, every status query panics.
    panic_on_status: bool,
    pub thumbnail_entered: Notify,
    pub thumbnail_release: Notify,
}

impl ScriptedBackend {
    pub fn new(job_id: &str) -> Self {
        Self {
            submit_result: Mutex::new(Some(Ok(SubmitOutcome::Accepted {
                job_id: job_id.to_string(),
            }))),
            statuses: Mutex::new(VecDeque::new()),
            thumbnails: Mutex::new(VecDeque::new()),
            status_calls: Mutex::new(Vec::new()),
            thumbnail_calls: AtomicUsize::new(0),
            hold_thumbnails: false,
            panic_on_status: false,
            thumbnail_entered: Notify::new(),
            thumbnail_release: Notify::new(),
        }
    }

    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<StatusReply, BackendError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn with_thumbnails(
        self,
        thumbnails: impl IntoIterator<Item = Result<Bytes, BackendError>>,
    ) -> Self {
        self.thumbnails.lock().unwrap().extend(thumbnails);
        self
    }

    pub fn with_submit_result(self, result: Result<SubmitOutcome, BackendError>) -> Self {
        *self.submit_result.lock().unwrap() = Some(result);
        self
    }

    pub fn holding_thumbnails(mut self) -> Self {
        self.hold_thumbnails = true;
        self
    }

    pub fn panicking_on_status(mut self) -> Self {
        self.panic_on_status = true;
        self
    }

    pub fn status_calls(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn thumbnail_calls(&self) -> usize {
        self.thumbnail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    async fn submit(
        &self,
        _request: &SubmitRequest,
        _strategy: SubmissionStrategy,
    ) -> Result<SubmitOutcome, BackendError> {
        self.submit_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(network_error()))
    }

    async fn status(&self, _job_id: &str) -> Result<StatusReply, BackendError> {
        self.status_calls.lock().unwrap().push(Instant::now());
        if self.panic_on_status {
            panic!("status backend exploded");
        }
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| processing(0, 0))
    }

    async fn thumbnail(&self, _job_id: &str) -> Result<Bytes, BackendError> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_thumbnails {
            self.thumbnail_entered.notify_one();
            self.thumbnail_release.notified().await;
        }
        let next = self.thumbnails.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(not_found()))
    }

    async fn artifact(&self, _artifact_url: &str) -> Result<Bytes, BackendError> {
        Ok(Bytes::from_static(b"video"))
    }

    fn artifact_url(&self, job_id: &str) -> String {
        format!("http://backend.test/videos/{job_id}")
    }
}
