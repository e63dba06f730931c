use clipfilter_core::{AppViewModel, FilterKey, Stage, ThumbnailView};

/// Turns a view model into the lines printed for it.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    match view.stage {
        Stage::Idle => {
            if view.submitting {
                lines.push(format!(
                    "Submitting {} ({})…",
                    view.source_url,
                    view.filter.label()
                ));
            }
        }
        Stage::Processing => {
            if let Some(job_id) = &view.job_id {
                lines.push(format!("Processing job {job_id}: applying filters…"));
            }
            if let Some(thumbnail) = &view.thumbnail {
                lines.push(preview_line(thumbnail));
            }
            lines.push(progress_line(view));
        }
        Stage::Done => {
            lines.push("Processing complete.".to_string());
            if let Some(url) = &view.artifact_url {
                lines.push(format!("Processed video: {url}"));
            }
        }
    }

    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    lines
}

pub fn progress_line(view: &AppViewModel) -> String {
    format!(
        "{}% ({} / {} frames)",
        view.percent, view.frames_done, view.total_frames
    )
}

pub fn preview_line(thumbnail: &ThumbnailView) -> String {
    match thumbnail {
        ThumbnailView::Preparing => "Preview: Preparing preview…".to_string(),
        ThumbnailView::Waiting => "Preview: Waiting for thumbnail…".to_string(),
        ThumbnailView::Ready(handle) => format!("Preview: {} ready", handle.url),
    }
}

/// Numbered filter menu with the current choice marked.
pub fn filter_menu(selected: FilterKey) -> Vec<String> {
    FilterKey::ALL
        .iter()
        .enumerate()
        .map(|(index, filter)| {
            let marker = if *filter == selected { '*' } else { ' ' };
            format!("{marker} {}) {}", index + 1, filter.label())
        })
        .collect()
}

/// Accepts a menu number, a label or a wire key.
pub fn parse_filter(input: &str) -> Option<FilterKey> {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| FilterKey::ALL.get(index).copied());
    }
    FilterKey::ALL.into_iter().find(|filter| {
        filter.label().eq_ignore_ascii_case(input) || filter.key().eq_ignore_ascii_case(input)
    })
}
