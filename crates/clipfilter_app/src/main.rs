mod config;
mod logging;
mod render;
mod session;

use anyhow::Context;
use clipfilter_engine::JobController;
use clipfilter_logging::clip_info;

use crate::config::AppConfig;
use crate::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::initialize();
    clip_info!("clipfilter starting; backend {}", config.backend_url);

    let controller = JobController::new(config.engine_settings(), config.default_video_url.clone())
        .with_context(|| format!("cannot use backend {}", config.backend_url))?;
    let download_dir = std::env::current_dir().context("cannot determine working directory")?;

    println!("clipfilter: backend {}", config.backend_url);
    Session::new(controller, download_dir).run().await
}
