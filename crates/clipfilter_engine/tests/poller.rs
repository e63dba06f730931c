mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clipfilter_engine::{PollEvent, PollSettings, StatusPoller};
use common::{
    completed, init_logging, job_error, network_error, not_found, processing, ScriptedBackend,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

const POLL: Duration = Duration::from_millis(700);
const BACKOFF: Duration = Duration::from_millis(1200);

fn settings() -> PollSettings {
    PollSettings {
        poll_interval: POLL,
        backoff_interval: BACKOFF,
        max_transient_failures: None,
    }
}

/// Runs one episode to its terminal event and returns everything it emitted.
async fn run_episode(backend: Arc<ScriptedBackend>, settings: PollSettings) -> Vec<PollEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::new(backend, settings);
    let _handle = poller.start(1, "abc123", tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn reports_progress_then_completion() {
    init_logging();
    let backend = Arc::new(
        ScriptedBackend::new("abc123").with_statuses([processing(10, 100), completed()]),
    );

    let events = run_episode(backend.clone(), settings()).await;

    assert_eq!(
        events,
        vec![
            PollEvent::Progress {
                episode: 1,
                frames_done: 10,
                total_frames: 100,
            },
            PollEvent::ThumbnailMissed { episode: 1 },
            PollEvent::Progress {
                episode: 1,
                frames_done: 0,
                total_frames: 0,
            },
            PollEvent::ThumbnailMissed { episode: 1 },
            PollEvent::Completed {
                episode: 1,
                artifact_url: "http://backend.test/videos/abc123".to_string(),
            },
        ]
    );
    let calls = backend.status_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1] - calls[0] >= POLL);
    assert!(calls[1] - calls[0] < BACKOFF);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_backs_off_without_surfacing() {
    init_logging();
    let backend = Arc::new(ScriptedBackend::new("abc123").with_statuses([
        Err(network_error()),
        processing(1, 10),
        completed(),
    ]));

    let events = run_episode(backend.clone(), settings()).await;

    assert!(events
        .iter()
        .all(|event| !matches!(event, PollEvent::Failed { .. })));
    assert!(matches!(events.last(), Some(PollEvent::Completed { .. })));

    let calls = backend.status_calls();
    assert_eq!(calls.len(), 3);
    let after_failure = calls[1] - calls[0];
    let after_success = calls[2] - calls[1];
    assert!(after_failure >= BACKOFF, "waited {after_failure:?}");
    assert!(after_success >= POLL && after_success < BACKOFF);
}

#[tokio::test(start_paused = true)]
async fn job_error_is_fatal_and_stops_polling() {
    init_logging();
    let backend = Arc::new(
        ScriptedBackend::new("abc123").with_statuses([processing(1, 10), job_error("decoder crashed")]),
    );

    let events = run_episode(backend.clone(), settings()).await;

    assert_eq!(
        events.last(),
        Some(&PollEvent::Failed {
            episode: 1,
            message: "decoder crashed".to_string(),
        })
    );
    tokio::time::sleep(BACKOFF * 4).await;
    assert_eq!(backend.status_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn thumbnail_is_not_fetched_again_after_first_success() {
    init_logging();
    let backend = Arc::new(
        ScriptedBackend::new("abc123")
            .with_statuses([
                processing(1, 10),
                processing(2, 10),
                processing(3, 10),
                processing(4, 10),
                completed(),
            ])
            .with_thumbnails([Err(not_found()), Ok(Bytes::from_static(b"jpg"))]),
    );

    let events = run_episode(backend.clone(), settings()).await;

    assert_eq!(backend.thumbnail_calls(), 2);
    let fetched: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, PollEvent::ThumbnailFetched { .. }))
        .collect();
    assert_eq!(
        fetched,
        vec![&PollEvent::ThumbnailFetched {
            episode: 1,
            bytes: Bytes::from_static(b"jpg"),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn transient_failure_cap_turns_into_job_failure() {
    init_logging();
    let backend = Arc::new(ScriptedBackend::new("abc123").with_statuses([
        Err(network_error()),
        Err(network_error()),
        Err(network_error()),
    ]));
    let settings = PollSettings {
        max_transient_failures: Some(2),
        ..settings()
    };

    let events = run_episode(backend.clone(), settings).await;

    assert_eq!(backend.status_calls().len(), 3);
    match events.last() {
        Some(PollEvent::Failed { message, .. }) => {
            assert!(message.starts_with("Lost contact with backend"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn stopped_poller_emits_nothing_from_in_flight_fetch() {
    init_logging();
    let backend = Arc::new(
        ScriptedBackend::new("abc123")
            .with_statuses([processing(5, 10)])
            .with_thumbnails([Ok(Bytes::from_static(b"late"))])
            .holding_thumbnails(),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::new(backend.clone(), settings());
    let mut handle = poller.start(7, "abc123", tx);

    backend.thumbnail_entered.notified().await;
    handle.stop();
    backend.thumbnail_release.notify_one();
    assert!(handle.wait().await);

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![PollEvent::Progress {
            episode: 7,
            frames_done: 5,
            total_frames: 10,
        }]
    );
    tokio::time::sleep(BACKOFF * 4).await;
    assert_eq!(backend.status_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_cancels_the_loop() {
    init_logging();
    let backend = Arc::new(ScriptedBackend::new("abc123"));
    let (tx, _rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::new(backend.clone(), settings());

    let handle = poller.start(1, "abc123", tx);
    tokio::time::sleep(POLL / 2).await;
    drop(handle);
    let calls_at_drop = backend.status_calls().len();

    tokio::time::sleep(POLL * 10).await;
    assert_eq!(backend.status_calls().len(), calls_at_drop);
}

#[tokio::test(start_paused = true)]
async fn panicking_loop_is_reported_by_wait() {
    init_logging();
    let backend = Arc::new(ScriptedBackend::new("abc123").panicking_on_status());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::new(backend.clone(), settings());

    let mut handle = poller.start(1, "abc123", tx);

    assert!(!handle.wait().await);
    assert!(handle.is_finished());
    assert_eq!(backend.status_calls().len(), 1);
    assert!(rx.recv().await.is_none());
}
