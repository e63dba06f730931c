//! Clipfilter engine: backend IO, status polling and the job controller.
mod backend;
mod controller;
mod persist;
mod poller;
mod resources;
mod settings;
mod thumbnail;
mod types;
mod wire;

pub use backend::{Backend, ReqwestBackend};
pub use controller::{ControllerError, JobController, DOWNLOAD_FILE_NAME};
pub use persist::{AtomicFileWriter, PersistError};
pub use poller::{PollSettings, PollerHandle, StatusPoller};
pub use resources::ResourceLifecycleManager;
pub use settings::{EngineSettings, SubmissionStrategy};
pub use thumbnail::{thumbnail_file_name, ThumbnailFetcher};
pub use types::{BackendError, FailureKind, PollEvent, SubmitOutcome};
pub use wire::{JobStatus, StatusReply, StatusSnapshot};
