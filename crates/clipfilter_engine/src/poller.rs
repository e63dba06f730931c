//! Status polling for one processing episode.
//!
//! A poller issues one status query at a time and waits for it to resolve
//! before deciding whether to schedule the next one, so results are always
//! observed in the order they were requested. Every suspend point races the
//! episode's [`CancellationToken`]; once it fires the loop emits nothing more.

use std::sync::Arc;
use std::time::Duration;

use clipfilter_core::EpisodeId;
use clipfilter_logging::{clip_debug, clip_error, clip_info, clip_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::settings::EngineSettings;
use crate::thumbnail::ThumbnailFetcher;
use crate::{Backend, PollEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub backoff_interval: Duration,
    pub max_transient_failures: Option<u32>,
}

impl From<&EngineSettings> for PollSettings {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            backoff_interval: settings.backoff_interval,
            max_transient_failures: settings.max_transient_failures,
        }
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn Backend>,
    settings: PollSettings,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn Backend>, settings: PollSettings) -> Self {
        Self { backend, settings }
    }

    /// Spawns the polling loop for `job_id` on the current runtime.
    pub fn start(
        &self,
        episode: EpisodeId,
        job_id: impl Into<String>,
        events: mpsc::UnboundedSender<PollEvent>,
    ) -> PollerHandle {
        let token = CancellationToken::new();
        let episode_loop = EpisodeLoop {
            backend: self.backend.clone(),
            fetcher: ThumbnailFetcher::new(self.backend.clone()),
            settings: self.settings,
            episode,
            job_id: job_id.into(),
            token: token.clone(),
            events,
        };
        let task = tokio::spawn(episode_loop.run());
        PollerHandle {
            episode,
            token,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop. Dropping the handle stops the loop.
pub struct PollerHandle {
    episode: EpisodeId,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the loop task to exit. Returns `false` if it panicked or
    /// was aborted.
    pub async fn wait(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return true;
        };
        match task.await {
            Ok(()) => true,
            Err(err) => {
                clip_error!("poller for episode {} did not exit cleanly: {}", self.episode, err);
                false
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct EpisodeLoop {
    backend: Arc<dyn Backend>,
    fetcher: ThumbnailFetcher,
    settings: PollSettings,
    episode: EpisodeId,
    job_id: String,
    token: CancellationToken,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl EpisodeLoop {
    async fn run(self) {
        let mut thumbnail_acquired = false;
        let mut transient_failures: u32 = 0;

        loop {
            let reply = tokio::select! {
                biased;
                _ = self.token.cancelled() => return,
                reply = self.backend.status(&self.job_id) => reply,
            };

            let delay = match reply {
                Err(err) => {
                    transient_failures = transient_failures.saturating_add(1);
                    if let Some(max) = self.settings.max_transient_failures {
                        if transient_failures > max {
                            clip_warn!(
                                "job {} unreachable after {} attempts: {}",
                                self.job_id,
                                transient_failures,
                                err
                            );
                            self.emit(PollEvent::Failed {
                                episode: self.episode,
                                message: format!("Lost contact with backend: {}", err.message),
                            });
                            return;
                        }
                    }
                    clip_warn!(
                        "status query for job {} failed ({}); retrying in {:?}",
                        self.job_id,
                        err,
                        self.settings.backoff_interval
                    );
                    self.settings.backoff_interval
                }
                Ok(reply) => {
                    transient_failures = 0;
                    if let Some(message) = reply.failure() {
                        clip_warn!("job {} failed: {}", self.job_id, message);
                        self.emit(PollEvent::Failed {
                            episode: self.episode,
                            message,
                        });
                        return;
                    }

                    let snapshot = reply.snapshot;
                    if !self.emit(PollEvent::Progress {
                        episode: self.episode,
                        frames_done: snapshot.frames_done(),
                        total_frames: snapshot.total_frames(),
                    }) {
                        return;
                    }

                    if !thumbnail_acquired {
                        let fetched = tokio::select! {
                            biased;
                            _ = self.token.cancelled() => return,
                            fetched = self.fetcher.try_fetch(&self.job_id) => fetched,
                        };
                        let event = match fetched {
                            Some(bytes) => {
                                thumbnail_acquired = true;
                                PollEvent::ThumbnailFetched {
                                    episode: self.episode,
                                    bytes,
                                }
                            }
                            None => PollEvent::ThumbnailMissed {
                                episode: self.episode,
                            },
                        };
                        if !self.emit(event) {
                            return;
                        }
                    }

                    if snapshot.is_completed() {
                        clip_info!("job {} completed", self.job_id);
                        self.emit(PollEvent::Completed {
                            episode: self.episode,
                            artifact_url: self.backend.artifact_url(&self.job_id),
                        });
                        return;
                    }
                    self.settings.poll_interval
                }
            };

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Sends `event` unless the episode was cancelled or nobody listens.
    fn emit(&self, event: PollEvent) -> bool {
        if self.token.is_cancelled() {
            clip_debug!("episode {} cancelled; dropping {}", self.episode, event);
            return false;
        }
        self.events.send(event).is_ok()
    }
}
