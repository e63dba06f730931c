//! Interactive terminal session.
//!
//! The session owns the [`JobController`] and translates typed lines into
//! form edits, submit and reset. While a job is processing it races poller
//! updates against user input so `r` can abandon the job at any time.

use std::path::PathBuf;

use anyhow::Context;
use clipfilter_core::Stage;
use clipfilter_engine::JobController;
use clipfilter_logging::{clip_info, clip_warn};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::render;

pub struct Session {
    controller: JobController,
    download_dir: PathBuf,
    input: Lines<BufReader<Stdin>>,
}

impl Session {
    pub fn new(controller: JobController, download_dir: PathBuf) -> Self {
        Self {
            controller,
            download_dir,
            input: BufReader::new(io::stdin()).lines(),
        }
    }

    /// Runs until the user quits or stdin closes.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            let keep_going = match self.controller.view().stage {
                Stage::Idle => self.idle().await?,
                Stage::Processing => self.processing().await?,
                Stage::Done => self.done().await?,
            };
            if !keep_going {
                clip_info!("session ended");
                return Ok(());
            }
        }
    }

    async fn idle(&mut self) -> anyhow::Result<bool> {
        let view = self.controller.view();
        let default_url = view.source_url.clone();
        let prompt = if default_url.is_empty() {
            "Video URL (or q to quit): ".to_string()
        } else {
            format!("Video URL [{default_url}] (or q to quit): ")
        };
        let Some(url) = self.prompt(&prompt).await? else {
            return Ok(false);
        };
        if url.eq_ignore_ascii_case("q") {
            return Ok(false);
        }
        if !url.is_empty() {
            self.controller.set_source_url(url);
        }

        for line in render::filter_menu(self.controller.view().filter) {
            println!("{line}");
        }
        let Some(choice) = self.prompt("Filter [enter keeps *]: ").await? else {
            return Ok(false);
        };
        if !choice.is_empty() {
            match render::parse_filter(&choice) {
                Some(filter) => self.controller.select_filter(filter),
                None => println!("Unknown filter {choice:?}; keeping the current one."),
            }
        }

        let view = self.controller.submit().await;
        self.controller.consume_dirty();
        print_lines(&render::render(&view));
        Ok(true)
    }

    async fn processing(&mut self) -> anyhow::Result<bool> {
        println!("Type r and enter to cancel and start over.");
        loop {
            tokio::select! {
                line = self.input.next_line() => {
                    let line = line.context("failed to read from stdin")?;
                    match line.as_deref().map(str::trim) {
                        None => {
                            self.controller.reset();
                            return Ok(false);
                        }
                        Some(cmd) if cmd.eq_ignore_ascii_case("r") => {
                            clip_info!("user abandoned the job");
                            self.controller.reset();
                            self.controller.consume_dirty();
                            return Ok(true);
                        }
                        Some(_) => {}
                    }
                }
                updated = self.controller.next_update() => {
                    if self.controller.consume_dirty() {
                        print_lines(&render::render(&self.controller.view()));
                    }
                    if !updated || self.controller.view().stage != Stage::Processing {
                        return Ok(true);
                    }
                }
            }
        }
    }

    async fn done(&mut self) -> anyhow::Result<bool> {
        match self.controller.download_artifact(&self.download_dir).await {
            Ok(path) => println!("Saved {}", path.display()),
            Err(err) => {
                clip_warn!("download into {:?} failed: {}", self.download_dir, err);
                println!("Download failed: {err}");
            }
        }

        let Some(answer) = self.prompt("Process another video? [Y/n]: ").await? else {
            return Ok(false);
        };
        if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("q") {
            return Ok(false);
        }
        self.controller.reset();
        self.controller.consume_dirty();
        Ok(true)
    }

    /// Prints `prompt` and reads one trimmed line; `None` at end of input.
    async fn prompt(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        let line = self
            .input
            .next_line()
            .await
            .context("failed to read from stdin")?;
        Ok(line.map(|line| line.trim().to_string()))
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
