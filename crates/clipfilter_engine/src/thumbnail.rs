use std::sync::Arc;

use bytes::Bytes;
use clipfilter_logging::{clip_debug, clip_info};

use crate::Backend;

const JOB_FILE_EXTENSION: &str = ".mp4";

/// File name of the preview image the backend writes for `job_id`.
pub fn thumbnail_file_name(job_id: &str) -> String {
    let base = job_id.strip_suffix(JOB_FILE_EXTENSION).unwrap_or(job_id);
    format!("{base}.jpg")
}

/// Makes one thumbnail fetch attempt per call.
///
/// Misses are routine while the backend has not produced a preview yet, so
/// they are reported as `None` rather than as errors.
#[derive(Clone)]
pub struct ThumbnailFetcher {
    backend: Arc<dyn Backend>,
}

impl ThumbnailFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn try_fetch(&self, job_id: &str) -> Option<Bytes> {
        match self.backend.thumbnail(job_id).await {
            Ok(bytes) => {
                clip_info!("thumbnail for job {} ready ({} bytes)", job_id, bytes.len());
                Some(bytes)
            }
            Err(err) => {
                clip_debug!("thumbnail for job {} not ready: {}", job_id, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::thumbnail_file_name;

    #[test]
    fn strips_trailing_video_extension() {
        assert_eq!(thumbnail_file_name("job1.mp4"), "job1.jpg");
        assert_eq!(thumbnail_file_name("abc123"), "abc123.jpg");
    }

    #[test]
    fn only_the_trailing_extension_is_stripped() {
        assert_eq!(thumbnail_file_name("clip.mp4.mp4"), "clip.mp4.jpg");
        assert_eq!(thumbnail_file_name("a.mp4b"), "a.mp4b.jpg");
        assert_eq!(thumbnail_file_name("movie.MP4"), "movie.MP4.jpg");
    }
}
