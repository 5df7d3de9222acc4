/// HTTP client for the generation API
///
/// One shared reqwest client, thin typed wrappers per endpoint, and the
/// bounded job-polling loop. Generation calls hide the sync/async split:
/// `generate_panorama` and `generate_world` always resolve to a finished
/// result, polling behind the scenes when the server hands back a job id.
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::models::{GenerateReply, GeneratedImage, JobSnapshot, JobState, Scenario, World3D};
use crate::config::Config;

/// Default per-request deadline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Health probes answer instantly or not at all
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Sync generation holds the request open while the GPU works
const GENERATE_TIMEOUT: Duration = Duration::from_secs(600);
/// Panorama and mesh downloads can be tens of megabytes
const ASSET_TIMEOUT: Duration = Duration::from_secs(120);

/// Boxed future for trait-object async methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can report the state of a job
///
/// The real implementation is `ApiClient`; tests script snapshots through
/// a fake. Splitting this out keeps `poll_job` testable without a server.
pub trait JobSource<T> {
    fn fetch_job<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobSnapshot<T>, ApiError>>;
}

/// Pacing and budget for the job-status poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive poll attempts
    pub interval: Duration,
    /// Attempts before giving up with a timeout
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// 1s interval, 180 attempts: about three minutes of patience
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 180,
        }
    }
}

/// Poll a job until it reaches a terminal state or the budget runs out
///
/// Each attempt awaits the previous fetch before sleeping the fixed
/// interval, so a slow server stretches the schedule instead of stacking
/// requests. Terminal outcomes:
/// - `completed` resolves to the job's result
/// - `failed` resolves to `JobFailed` with the server's message
/// - HTTP 404 resolves to `JobNotFound` immediately, no retry
/// - budget exhaustion resolves to `Timeout`
///
/// Transient per-attempt failures consume the attempt and the loop keeps
/// going. Cancellation is dropping the future.
pub async fn poll_job<S, T>(source: &S, job_id: &str, policy: PollPolicy) -> Result<T, ApiError>
where
    S: JobSource<T>,
{
    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            tokio::time::sleep(policy.interval).await;
        }

        match source.fetch_job(job_id).await {
            Ok(snapshot) => match snapshot.status {
                JobState::Completed => {
                    return snapshot.result.ok_or_else(|| {
                        ApiError::Unexpected("job completed without a result".to_string())
                    });
                }
                JobState::Failed => {
                    return Err(ApiError::JobFailed(
                        snapshot.error.unwrap_or_else(|| "no error reported".to_string()),
                    ));
                }
                JobState::Pending => {}
            },
            Err(ApiError::JobNotFound) => return Err(ApiError::JobNotFound),
            Err(err) => {
                eprintln!("⚠️  Poll attempt {} failed: {err}", attempt + 1);
            }
        }
    }

    Err(ApiError::Timeout)
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    scenario: &'a str,
}

#[derive(Serialize)]
struct WorldBody<'a> {
    image_id: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Typed client over the generation API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build the shared client
    ///
    /// A TLS/client construction failure means the process cannot do
    /// anything useful, so this panics with a clear message.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to initialize the HTTP client");

        Self {
            http,
            base_url: config.api_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve an asset URL the server handed us
    ///
    /// The backend returns absolute URLs in S3 deployments and
    /// server-relative paths in local ones.
    pub fn resolve_asset(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// Probe reachability; returns the (pretty-printed) health payload
    pub async fn check_health(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Unexpected(format!("unreadable health payload: {err}")))?;

        let pretty = serde_json::from_str::<serde_json::Value>(&body)
            .and_then(|value| serde_json::to_string_pretty(&value))
            .unwrap_or(body);

        Ok(pretty)
    }

    /// Fetch the full gallery, newest first (server ordering)
    pub async fn fetch_images(&self) -> Result<Vec<GeneratedImage>, ApiError> {
        self.get_json("/api/images").await
    }

    /// Fetch a single panorama by id
    pub async fn fetch_image(&self, image_id: &str) -> Result<GeneratedImage, ApiError> {
        self.get_json(&format!("/api/images/{image_id}")).await
    }

    /// Delete a panorama server-side
    pub async fn delete_image(&self, image_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/images/{image_id}")))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        Ok(())
    }

    /// Request a panorama and wait for the finished image
    pub async fn generate_panorama(&self, scenario: Scenario) -> Result<GeneratedImage, ApiError> {
        let body = GenerateBody { scenario: scenario.id() };
        let reply: GenerateReply<GeneratedImage> =
            self.post_json("/api/generate", &body).await?;

        match reply {
            GenerateReply::Ready(image) => Ok(image),
            GenerateReply::Queued { job_id } => {
                println!("⏳ Panorama job {job_id} queued, polling...");
                poll_job(self, &job_id, PollPolicy::default()).await
            }
        }
    }

    /// Request a 3D world derived from a panorama and wait for it
    pub async fn generate_world(&self, image_id: &str) -> Result<World3D, ApiError> {
        let body = WorldBody { image_id };
        let reply: GenerateReply<World3D> =
            self.post_json("/api/generate-3d", &body).await?;

        match reply {
            GenerateReply::Ready(world) => Ok(world),
            GenerateReply::Queued { job_id } => {
                println!("⏳ World job {job_id} queued, polling...");
                poll_job(self, &job_id, PollPolicy::default()).await
            }
        }
    }

    /// One job-status snapshot; 404 means the id is unknown
    pub async fn job_snapshot<T>(&self, job_id: &str) -> Result<JobSnapshot<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(self.url(&format!("/api/jobs/{job_id}")))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::JobNotFound);
        }

        Self::decode(response).await
    }

    /// Download a panorama image or world mesh
    pub async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let absolute = self.resolve_asset(url);

        let response = self
            .http
            .get(&absolute)
            .timeout(ASSET_TIMEOUT)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Unexpected(format!("download interrupted: {err}")))?;

        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(GENERATE_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Unexpected(format!("undecodable response: {err}")))
    }

    /// Turn a non-2xx response into a Server error with its detail
    ///
    /// FastAPI reports failures as {"detail": "..."}; anything else falls
    /// back to the raw body, capped so a traceback cannot flood the banner.
    async fn status_error(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("no detail").to_string()
                } else {
                    body
                }
            });

        let detail = if detail.chars().count() > 200 {
            let mut short: String = detail.chars().take(200).collect();
            short.push_str("...");
            short
        } else {
            detail
        };

        ApiError::Server { status: status.as_u16(), detail }
    }
}

impl<T> JobSource<T> for ApiClient
where
    T: DeserializeOwned + Send + 'static,
{
    fn fetch_job<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobSnapshot<T>, ApiError>> {
        Box::pin(self.job_snapshot(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn beach_image() -> GeneratedImage {
        GeneratedImage {
            id: "img-1".to_string(),
            prompt: "a beach".to_string(),
            image_url: "/images/img-1.png".to_string(),
            created_at: "2024-07-31T15:42:12".to_string(),
            scenario: "beach".to_string(),
        }
    }

    fn pending() -> Result<JobSnapshot<GeneratedImage>, ApiError> {
        Ok(JobSnapshot { status: JobState::Pending, result: None, error: None })
    }

    fn completed() -> Result<JobSnapshot<GeneratedImage>, ApiError> {
        Ok(JobSnapshot {
            status: JobState::Completed,
            result: Some(beach_image()),
            error: None,
        })
    }

    fn failed(message: &str) -> Result<JobSnapshot<GeneratedImage>, ApiError> {
        Ok(JobSnapshot {
            status: JobState::Failed,
            result: None,
            error: Some(message.to_string()),
        })
    }

    /// Plays back a scripted sequence of snapshots, then stays pending
    struct FakeSource {
        script: Mutex<VecDeque<Result<JobSnapshot<GeneratedImage>, ApiError>>>,
        calls: AtomicU32,
    }

    impl FakeSource {
        fn new(script: Vec<Result<JobSnapshot<GeneratedImage>, ApiError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JobSource<GeneratedImage> for FakeSource {
        fn fetch_job<'a>(
            &'a self,
            _job_id: &'a str,
        ) -> BoxFuture<'a, Result<JobSnapshot<GeneratedImage>, ApiError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front().unwrap_or_else(pending);
            Box::pin(async move { next })
        }
    }

    fn quick_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy { interval: Duration::ZERO, max_attempts }
    }

    #[test]
    fn test_default_policy_budget() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 180);
    }

    #[tokio::test]
    async fn test_poll_resolves_on_completion_and_stops() {
        let source = FakeSource::new(vec![pending(), pending(), completed()]);

        let image = poll_job(&source, "job-1", quick_policy(10)).await.unwrap();

        assert_eq!(image.id, "img-1");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_poll_times_out_after_budget() {
        let source = FakeSource::new(vec![]);

        let err = poll_job(&source, "job-1", quick_policy(5)).await.unwrap_err();

        assert_eq!(err, ApiError::Timeout);
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_poll_aborts_on_not_found() {
        let source = FakeSource::new(vec![pending(), Err(ApiError::JobNotFound), completed()]);

        let err = poll_job(&source, "job-1", quick_policy(10)).await.unwrap_err();

        assert_eq!(err, ApiError::JobNotFound);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_poll_surfaces_job_failure() {
        let source = FakeSource::new(vec![pending(), failed("CUDA out of memory")]);

        let err = poll_job(&source, "job-1", quick_policy(10)).await.unwrap_err();

        assert_eq!(err, ApiError::JobFailed("CUDA out of memory".to_string()));
    }

    #[tokio::test]
    async fn test_poll_rides_out_transient_errors() {
        let source = FakeSource::new(vec![
            Err(ApiError::Network("connection reset".to_string())),
            Err(ApiError::Timeout),
            completed(),
        ]);

        let image = poll_job(&source, "job-1", quick_policy(10)).await.unwrap();

        assert_eq!(image.id, "img-1");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_poll_rejects_completion_without_result() {
        let source = FakeSource::new(vec![Ok(JobSnapshot {
            status: JobState::Completed,
            result: None,
            error: None,
        })]);

        let err = poll_job(&source, "job-1", quick_policy(10)).await.unwrap_err();

        assert!(matches!(err, ApiError::Unexpected(_)));
    }

    #[test]
    fn test_asset_urls_resolve_against_base() {
        let client = ApiClient::new(&Config::default());

        assert_eq!(
            client.resolve_asset("/images/abc.png"),
            "http://localhost:8000/images/abc.png"
        );
        assert_eq!(
            client.resolve_asset("images/abc.png"),
            "http://localhost:8000/images/abc.png"
        );
        assert_eq!(
            client.resolve_asset("https://cdn.example.com/abc.png"),
            "https://cdn.example.com/abc.png"
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let client = ApiClient::new(&Config::default());

        assert_eq!(client.url("/api/health"), "http://localhost:8000/api/health");
        assert_eq!(client.url("/api/jobs/j-1"), "http://localhost:8000/api/jobs/j-1");
    }
}
