//! Clipfilter core: pure job-lifecycle state machine and view-model helpers.
mod effect;
mod job;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use job::{EpisodeId, FilterKey, Job, SubmitRequest, ThumbnailHandle};
pub use msg::Msg;
pub use progress::percentage;
pub use state::{AppState, Phase, ProcessingState, Stage};
pub use update::update;
pub use view_model::{AppViewModel, ThumbnailView};
