use url::Url;

use crate::{AppState, Effect, Job, Msg, Phase, ProcessingState, Stage, SubmitRequest};

/// Pure update function: applies a message to state and returns any effects.
///
/// Results tagged with an episode other than the current one are ignored,
/// except that a stale thumbnail handle is handed back for release.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SourceUrlChanged(url) => {
            state.set_source_url(url);
            Vec::new()
        }
        Msg::FilterSelected(filter) => {
            state.set_filter(filter);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmitAccepted { episode, job_id } => {
            if !state.accepts_submission_result(episode) {
                return (state, Vec::new());
            }
            let Some(request) = state.take_pending() else {
                return (state, Vec::new());
            };
            state.take_phase(Phase::Processing(ProcessingState {
                job: job_from(request, job_id.clone()),
                frames_done: 0,
                total_frames: 0,
                thumbnail: None,
                thumbnail_attempted: false,
            }));
            vec![Effect::StartPolling { episode, job_id }]
        }
        Msg::SubmitCompleted {
            episode,
            job_id,
            artifact_url,
        } => {
            if !state.accepts_submission_result(episode) {
                return (state, Vec::new());
            }
            if let Some(request) = state.take_pending() {
                state.take_phase(Phase::Done {
                    job: job_from(request, job_id),
                    artifact_url,
                });
            }
            Vec::new()
        }
        Msg::SubmitFailed { episode, message } => {
            if state.accepts_submission_result(episode) {
                state.take_pending();
                state.set_error(message);
            }
            Vec::new()
        }
        Msg::StatusProgress {
            episode,
            frames_done,
            total_frames,
        } => {
            if !state.accepts_poll_result(episode) {
                return (state, Vec::new());
            }
            let changed = match state.processing_mut() {
                Some(processing)
                    if processing.frames_done != frames_done
                        || processing.total_frames != total_frames =>
                {
                    processing.frames_done = frames_done;
                    processing.total_frames = total_frames;
                    true
                }
                _ => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ThumbnailAcquired { episode, handle } => {
            if !state.accepts_poll_result(episode) {
                return (state, vec![Effect::ReleaseThumbnail { handle }]);
            }
            let previous = state.processing_mut().and_then(|processing| {
                processing.thumbnail_attempted = true;
                processing.thumbnail.replace(handle.clone())
            });
            state.mark_dirty();
            match previous {
                Some(previous) if previous != handle => {
                    vec![Effect::ReleaseThumbnail { handle: previous }]
                }
                _ => Vec::new(),
            }
        }
        Msg::ThumbnailMissed { episode } => {
            if state.accepts_poll_result(episode) {
                if let Some(processing) = state.processing_mut() {
                    if !processing.thumbnail_attempted {
                        processing.thumbnail_attempted = true;
                        state.mark_dirty();
                    }
                }
            }
            Vec::new()
        }
        Msg::JobCompleted {
            episode,
            artifact_url,
        } => {
            if !state.accepts_poll_result(episode) {
                return (state, Vec::new());
            }
            let Some(job) = state.processing_mut().map(|p| p.job.clone()) else {
                return (state, Vec::new());
            };
            let released = state.take_phase(Phase::Done { job, artifact_url });
            leave_processing(released)
        }
        Msg::JobFailed { episode, message } => {
            if !state.accepts_poll_result(episode) {
                return (state, Vec::new());
            }
            let released = state.take_phase(Phase::Idle);
            state.set_error(message);
            leave_processing(released)
        }
        Msg::ResetClicked => {
            let was_processing = state.stage() == Stage::Processing;
            let released = state.begin_episode();
            let mut effects = Vec::new();
            if was_processing {
                effects.push(Effect::StopPolling);
            }
            if let Some(handle) = released {
                effects.push(Effect::ReleaseThumbnail { handle });
            }
            effects
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.is_submitting() {
        return Vec::new();
    }
    let video_url = state.source_url().trim().to_string();
    if let Err(message) = validate_source_url(&video_url) {
        state.set_error(message);
        return Vec::new();
    }

    // Submitting from any stage implies a reset of the previous episode.
    let was_processing = state.stage() == Stage::Processing;
    let released = state.begin_episode();
    let request = SubmitRequest {
        video_url,
        filter: state.filter(),
    };
    state.set_pending(request.clone());

    let mut effects = Vec::with_capacity(3);
    if was_processing {
        effects.push(Effect::StopPolling);
    }
    if let Some(handle) = released {
        effects.push(Effect::ReleaseThumbnail { handle });
    }
    effects.push(Effect::SubmitJob {
        episode: state.episode(),
        request,
    });
    effects
}

fn leave_processing(released: Option<crate::ThumbnailHandle>) -> Vec<Effect> {
    let mut effects = vec![Effect::StopPolling];
    if let Some(handle) = released {
        effects.push(Effect::ReleaseThumbnail { handle });
    }
    effects
}

fn validate_source_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("Video URL is required".to_string());
    }
    Url::parse(url)
        .map(|_| ())
        .map_err(|err| format!("Invalid video URL: {err}"))
}

fn job_from(request: SubmitRequest, id: String) -> Job {
    Job {
        id,
        source_url: request.video_url,
        filter: request.filter,
    }
}
