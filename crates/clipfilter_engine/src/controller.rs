use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use clipfilter_core::{
    update, AppState, AppViewModel, Effect, EpisodeId, FilterKey, Msg, Phase, Stage,
    SubmitRequest,
};
use clipfilter_logging::{clip_debug, clip_error, clip_info, clip_warn};
use tokio::sync::mpsc;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::poller::{PollSettings, PollerHandle, StatusPoller};
use crate::resources::ResourceLifecycleManager;
use crate::settings::EngineSettings;
use crate::{Backend, BackendError, PollEvent, ReqwestBackend, SubmitOutcome};

/// File name used when saving a finished artifact.
pub const DOWNLOAD_FILE_NAME: &str = "processed-video.mp4";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("no processed video is available yet")]
    NotDone,
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Drives one job at a time through submit, polling and reset.
///
/// All state changes go through [`clipfilter_core::update`]; the controller
/// only executes the effects it returns and feeds asynchronous results back
/// in as messages.
pub struct JobController {
    backend: Arc<dyn Backend>,
    settings: EngineSettings,
    poller: StatusPoller,
    state: AppState,
    resources: ResourceLifecycleManager,
    active: Option<PollerHandle>,
    events_tx: mpsc::UnboundedSender<PollEvent>,
    events_rx: mpsc::UnboundedReceiver<PollEvent>,
}

impl JobController {
    pub fn new(
        settings: EngineSettings,
        default_source_url: impl Into<String>,
    ) -> Result<Self, ControllerError> {
        let backend = ReqwestBackend::new(&settings)?;
        Self::with_backend(Arc::new(backend), settings, default_source_url)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        settings: EngineSettings,
        default_source_url: impl Into<String>,
    ) -> Result<Self, ControllerError> {
        settings.validate().map_err(ControllerError::InvalidSettings)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::new(backend.clone(), PollSettings::from(&settings));
        Ok(Self {
            backend,
            settings,
            poller,
            state: AppState::with_source_url(default_source_url),
            resources: ResourceLifecycleManager::new(),
            active: None,
            events_tx,
            events_rx,
        })
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn resources(&self) -> &ResourceLifecycleManager {
        &self.resources
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// True while a poll loop for the current episode is running.
    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|poller| !poller.is_stopped() && !poller.is_finished())
    }

    /// Bytes behind the thumbnail currently shown, if any.
    pub fn thumbnail_bytes(&self) -> Option<&Bytes> {
        self.state
            .thumbnail()
            .and_then(|handle| self.resources.bytes(handle))
    }

    pub fn set_source_url(&mut self, url: impl Into<String>) {
        self.dispatch(Msg::SourceUrlChanged(url.into()));
    }

    pub fn select_filter(&mut self, filter: FilterKey) {
        self.dispatch(Msg::FilterSelected(filter));
    }

    /// Submits the current form. Any previous episode is abandoned first.
    pub async fn submit(&mut self) -> AppViewModel {
        if let Some((episode, request)) = self.dispatch(Msg::SubmitClicked) {
            let msg = self.perform_submission(episode, &request).await;
            self.dispatch(msg);
        }
        self.view()
    }

    /// Returns to idle from any stage, stopping polling and releasing the
    /// thumbnail.
    pub fn reset(&mut self) {
        self.dispatch(Msg::ResetClicked);
    }

    /// Waits for the next poller observation of the current episode and
    /// applies it. Returns `false` when no episode is being processed.
    pub async fn next_update(&mut self) -> bool {
        while self.state.stage() == Stage::Processing {
            let Some(event) = self.events_rx.recv().await else {
                return false;
            };
            if !self.state.accepts_poll_result(event.episode()) {
                clip_debug!(
                    "discarding event from episode {} (current {})",
                    event.episode(),
                    self.state.episode()
                );
                continue;
            }
            self.apply_poll_event(event);
            return true;
        }
        false
    }

    /// Applies poller observations until the job leaves `processing`.
    pub async fn run_until_settled(&mut self) -> AppViewModel {
        while self.next_update().await {}
        self.view()
    }

    /// Saves the finished artifact into `dir`.
    ///
    /// Failures are logged and returned; they never change the stage.
    pub async fn download_artifact(&self, dir: &Path) -> Result<PathBuf, ControllerError> {
        let Phase::Done { artifact_url, .. } = self.state.phase() else {
            return Err(ControllerError::NotDone);
        };
        let result = self.save_artifact(artifact_url, dir).await;
        match &result {
            Ok(path) => clip_info!("saved {} to {}", artifact_url, path.display()),
            Err(err) => clip_error!("Download failed: {}", err),
        }
        result
    }

    async fn save_artifact(&self, artifact_url: &str, dir: &Path) -> Result<PathBuf, ControllerError> {
        let bytes = self.backend.artifact(artifact_url).await?;
        let writer = AtomicFileWriter::new(dir.to_path_buf());
        Ok(writer.write(DOWNLOAD_FILE_NAME, &bytes)?)
    }

    async fn perform_submission(&self, episode: EpisodeId, request: &SubmitRequest) -> Msg {
        clip_info!(
            "submitting {} with filter {} (episode {})",
            request.video_url,
            request.filter.key(),
            episode
        );
        match self.backend.submit(request, self.settings.submission).await {
            Ok(SubmitOutcome::Accepted { job_id }) => {
                clip_info!("job {} accepted", job_id);
                Msg::SubmitAccepted { episode, job_id }
            }
            Ok(SubmitOutcome::Completed {
                job_id,
                artifact_url,
            }) => {
                clip_info!("job {} processed synchronously", job_id);
                Msg::SubmitCompleted {
                    episode,
                    job_id,
                    artifact_url,
                }
            }
            Err(err) => {
                clip_warn!("submission failed: {}", err);
                let message = if err.message.trim().is_empty() {
                    "Failed to start processing".to_string()
                } else {
                    err.message
                };
                Msg::SubmitFailed { episode, message }
            }
        }
    }

    fn apply_poll_event(&mut self, event: PollEvent) {
        let msg = match event {
            PollEvent::Progress {
                episode,
                frames_done,
                total_frames,
            } => Msg::StatusProgress {
                episode,
                frames_done,
                total_frames,
            },
            PollEvent::ThumbnailFetched { episode, bytes } => Msg::ThumbnailAcquired {
                episode,
                handle: self.resources.replace(bytes),
            },
            PollEvent::ThumbnailMissed { episode } => Msg::ThumbnailMissed { episode },
            PollEvent::Completed {
                episode,
                artifact_url,
            } => Msg::JobCompleted {
                episode,
                artifact_url,
            },
            PollEvent::Failed { episode, message } => Msg::JobFailed { episode, message },
        };
        self.dispatch(msg);
    }

    /// Runs `msg` through `update` and executes the resulting effects.
    ///
    /// A submission effect is returned instead of executed because it has
    /// to be awaited by the caller.
    fn dispatch(&mut self, msg: Msg) -> Option<(EpisodeId, SubmitRequest)> {
        let before = self.state.stage();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        let after = self.state.stage();
        if before != after {
            clip_info!(
                "stage {:?} -> {:?} (episode {})",
                before,
                after,
                self.state.episode()
            );
        }

        let mut submission = None;
        for effect in effects {
            match effect {
                Effect::SubmitJob { episode, request } => submission = Some((episode, request)),
                Effect::StartPolling { episode, job_id } => {
                    self.stop_polling();
                    self.active = Some(self.poller.start(episode, job_id, self.events_tx.clone()));
                }
                Effect::StopPolling => self.stop_polling(),
                Effect::ReleaseThumbnail { handle } => {
                    self.resources.release(&handle);
                }
            }
        }
        submission
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.active.take() {
            clip_debug!("stopping poller for episode {}", poller.episode());
            poller.stop();
        }
    }
}
