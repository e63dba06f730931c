use bytes::Bytes;
use clipfilter_core::SubmitRequest;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use url::Url;

use crate::settings::{EngineSettings, SubmissionStrategy};
use crate::thumbnail::thumbnail_file_name;
use crate::wire::{PollingSubmitBody, StatusReply, StatusSnapshot, SyncSubmitBody};
use crate::{BackendError, FailureKind, SubmitOutcome};

/// The processing service, seen from the client.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /process`, decoded according to `strategy`.
    async fn submit(
        &self,
        request: &SubmitRequest,
        strategy: SubmissionStrategy,
    ) -> Result<SubmitOutcome, BackendError>;

    /// `GET /status/{job_id}`. Non-ok responses with a decodable body are
    /// returned as replies; only transport and decode failures are errors.
    async fn status(&self, job_id: &str) -> Result<StatusReply, BackendError>;

    /// `GET /thumb/{base}.jpg`, bypassing any HTTP cache.
    async fn thumbnail(&self, job_id: &str) -> Result<Bytes, BackendError>;

    /// Downloads a finished artifact.
    async fn artifact(&self, artifact_url: &str) -> Result<Bytes, BackendError>;

    /// Where the finished artifact for `job_id` will be served.
    fn artifact_url(&self, job_id: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: &EngineSettings) -> Result<Self, BackendError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Resolves a server-relative path such as `/videos/x.mp4` against the base url.
    fn resolve_path(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    fn decode_submission(
        &self,
        bytes: &[u8],
        strategy: SubmissionStrategy,
    ) -> Result<SubmitOutcome, BackendError> {
        match strategy {
            SubmissionStrategy::Polling => {
                let body: PollingSubmitBody = decode_json(bytes)?;
                match body.job_id.filter(|id| !id.is_empty()) {
                    Some(job_id) => Ok(SubmitOutcome::Accepted { job_id }),
                    None => Err(BackendError::new(
                        FailureKind::MissingField("job_id"),
                        non_empty(body.error)
                            .unwrap_or_else(|| "Malformed response: missing job_id".to_string()),
                    )),
                }
            }
            SubmissionStrategy::Synchronous => {
                let body: SyncSubmitBody = decode_json(bytes)?;
                match body.path.filter(|path| !path.is_empty()) {
                    Some(path) => {
                        let job_id = path
                            .trim_end_matches('/')
                            .rsplit('/')
                            .next()
                            .unwrap_or(path.as_str())
                            .to_string();
                        Ok(SubmitOutcome::Completed {
                            job_id,
                            artifact_url: self.resolve_path(&path),
                        })
                    }
                    None => Err(BackendError::new(
                        FailureKind::MissingField("path"),
                        non_empty(body.error)
                            .unwrap_or_else(|| "Malformed response: missing path".to_string()),
                    )),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit(
        &self,
        request: &SubmitRequest,
        strategy: SubmissionStrategy,
    ) -> Result<SubmitOutcome, BackendError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(&["process"]))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                format!("Request failed with status {}", status.as_u16())
            } else {
                text
            };
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        self.decode_submission(&bytes, strategy)
    }

    async fn status(&self, job_id: &str) -> Result<StatusReply, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["status", job_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let http_status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let snapshot: StatusSnapshot = decode_json(&bytes)?;
        Ok(StatusReply {
            http_status,
            snapshot,
        })
    }

    async fn thumbnail(&self, job_id: &str) -> Result<Bytes, BackendError> {
        let file_name = thumbnail_file_name(job_id);
        // The backend rewrites the same path while it works; never let a
        // cache answer with an earlier 404 or an older frame.
        let response = self
            .client
            .get(self.endpoint(&["thumb", file_name.as_str()]))
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if bytes.is_empty() {
            return Err(BackendError::new(FailureKind::Decode, "empty thumbnail body"));
        }
        Ok(bytes)
    }

    async fn artifact(&self, artifact_url: &str) -> Result<Bytes, BackendError> {
        let url = Url::parse(artifact_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                "Failed to fetch video",
            ));
        }
        response.bytes().await.map_err(map_reqwest_error)
    }

    fn artifact_url(&self, job_id: &str) -> String {
        self.endpoint(&["videos", job_id]).to_string()
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(bytes).map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.is_empty())
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() || err.is_body() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> ReqwestBackend {
        ReqwestBackend::new(&EngineSettings::with_base_url(base)).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let plain = backend("http://localhost:8080");
        assert_eq!(
            plain.endpoint(&["status", "abc123"]).as_str(),
            "http://localhost:8080/status/abc123"
        );

        let nested = backend("http://localhost:8080/api/");
        assert_eq!(
            nested.endpoint(&["thumb", "job1.jpg"]).as_str(),
            "http://localhost:8080/api/thumb/job1.jpg"
        );
    }

    #[test]
    fn job_ids_are_percent_encoded() {
        let plain = backend("http://localhost:8080");
        assert_eq!(
            plain.artifact_url("a b"),
            "http://localhost:8080/videos/a%20b"
        );
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let plain = backend("http://localhost:8080/");
        assert_eq!(
            plain.resolve_path("/videos/out.mp4"),
            "http://localhost:8080/videos/out.mp4"
        );
        assert_eq!(
            plain.resolve_path("videos/out.mp4"),
            "http://localhost:8080/videos/out.mp4"
        );
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        let err = ReqwestBackend::new(&EngineSettings::with_base_url("mailto:ops@example.com"))
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
