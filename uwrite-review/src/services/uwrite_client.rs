//! Uwrite API client
//!
//! Upload a file, create a similarity check on it, then poll the check until
//! it reaches a terminal state. The poll loop owns its own interval and
//! timeout; callers only see a report or an error.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::io::ReaderStream;

use crate::config::UwriteConfig;
use crate::models::ContentStream;

const USER_AGENT: &str = concat!("uwrite-review/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Uwrite client errors
#[derive(Debug, Error)]
pub enum UwriteError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API key or secret")]
    InvalidCredentials,

    #[error("Check {check_id} failed: {message}")]
    CheckFailed { check_id: i64, message: String },

    #[error("Check {check_id} did not complete within {timeout_secs}s")]
    Timeout { check_id: i64, timeout_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check profile: which corpus the document is compared against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "CheckTypeSetting")]
pub enum CheckType {
    MyLibrary,
    #[default]
    Web,
    External,
    Combined,
}

impl CheckType {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckType::MyLibrary => "my_library",
            CheckType::Web => "web",
            CheckType::External => "external",
            CheckType::Combined => "combined",
        }
    }

    /// Legacy numeric selector (0 = my_library, 1 = web, ...)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(CheckType::MyLibrary),
            1 => Some(CheckType::Web),
            2 => Some(CheckType::External),
            3 => Some(CheckType::Combined),
            _ => None,
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if let Ok(index) = normalized.parse::<u8>() {
            return CheckType::from_index(index)
                .ok_or_else(|| format!("Unknown check type index: {}", index));
        }
        match normalized.as_str() {
            "my_library" | "mylibrary" | "library" => Ok(CheckType::MyLibrary),
            "web" => Ok(CheckType::Web),
            "external" | "database" => Ok(CheckType::External),
            "combined" => Ok(CheckType::Combined),
            other => Err(format!("Unknown check type: {}", other)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CheckTypeSetting {
    Index(u8),
    Name(String),
}

impl TryFrom<CheckTypeSetting> for CheckType {
    type Error = String;

    fn try_from(setting: CheckTypeSetting) -> Result<Self, Self::Error> {
        match setting {
            CheckTypeSetting::Index(index) => CheckType::from_index(index)
                .ok_or_else(|| format!("Unknown check type index: {}", index)),
            CheckTypeSetting::Name(name) => name.parse(),
        }
    }
}

/// Uploaded file handle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadedFile {
    pub id: i64,
}

/// Created check handle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckHandle {
    pub id: i64,
}

/// Report of a completed check
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckReport {
    /// Matched text percentage (0-100)
    pub similarity: f32,
    pub view_url: String,
    pub view_edit_url: Option<String>,
}

/// Remote check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Done,
    Failed,
}

/// Check state as returned by the status endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckInfo {
    pub id: i64,
    pub status: CheckStatus,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub report: Option<CheckReport>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateCheckRequest<'a> {
    file_id: i64,
    #[serde(rename = "type")]
    check_type: &'a str,
    exclude_citations: bool,
    exclude_references: bool,
}

/// Remote similarity-check operations
#[async_trait]
pub trait CheckClient: Send + Sync {
    /// Stream `content` to the service
    async fn upload_file(
        &self,
        content: ContentStream,
        extension: &str,
        base_name: &str,
    ) -> Result<UploadedFile, UwriteError>;

    async fn create_check(
        &self,
        file_id: i64,
        check_type: CheckType,
        exclude_citations: bool,
        exclude_references: bool,
    ) -> Result<CheckHandle, UwriteError>;

    /// Block until the check is done (or failed, or timed out)
    async fn wait_for_check(&self, check_id: i64) -> Result<CheckReport, UwriteError>;
}

/// HTTP client for the Uwrite API
pub struct UwriteClient {
    http_client: reqwest::Client,
    base_url: String,
    key: String,
    secret: String,
    poll_interval: Duration,
    check_timeout: Duration,
    rate_limiter: DefaultDirectRateLimiter,
}

impl fmt::Debug for UwriteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UwriteClient")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("check_timeout", &self.check_timeout)
            .finish_non_exhaustive()
    }
}

impl UwriteClient {
    pub fn new(config: &UwriteConfig) -> Result<Self, UwriteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| UwriteError::NetworkError(e.to_string()))?;

        let per_second = NonZeroU32::new(config.status_requests_per_second)
            .unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key: config.key.clone().unwrap_or_default(),
            secret: config.secret.clone().unwrap_or_default(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            check_timeout: Duration::from_secs(config.check_timeout_secs),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch the current state of a check
    pub async fn get_check(&self, check_id: i64) -> Result<CheckInfo, UwriteError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .http_client
            .get(self.url(&format!("checks/{}", check_id)))
            .basic_auth(&self.key, Some(&self.secret))
            .send()
            .await
            .map_err(|e| UwriteError::NetworkError(e.to_string()))?;

        parse_response(response).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UwriteError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(UwriteError::InvalidCredentials);
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(UwriteError::ApiError(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| UwriteError::ParseError(e.to_string()))
}

#[async_trait]
impl CheckClient for UwriteClient {
    async fn upload_file(
        &self,
        content: ContentStream,
        extension: &str,
        base_name: &str,
    ) -> Result<UploadedFile, UwriteError> {
        let file_name = if extension.is_empty() {
            base_name.to_string()
        } else {
            format!("{}.{}", base_name, extension)
        };

        let body = reqwest::Body::wrap_stream(ReaderStream::new(content));
        let form = Form::new()
            .text("file_type", extension.to_string())
            .text("name", base_name.to_string())
            .part("file", Part::stream(body).file_name(file_name));

        tracing::debug!(extension, base_name, "Uploading file to Uwrite");

        let response = self
            .http_client
            .post(self.url("files"))
            .basic_auth(&self.key, Some(&self.secret))
            .multipart(form)
            .send()
            .await
            .map_err(|e| UwriteError::NetworkError(e.to_string()))?;

        let file: UploadedFile = parse_response(response).await?;
        tracing::debug!(file_id = file.id, "Upload accepted");
        Ok(file)
    }

    async fn create_check(
        &self,
        file_id: i64,
        check_type: CheckType,
        exclude_citations: bool,
        exclude_references: bool,
    ) -> Result<CheckHandle, UwriteError> {
        let request = CreateCheckRequest {
            file_id,
            check_type: check_type.as_str(),
            exclude_citations,
            exclude_references,
        };

        let response = self
            .http_client
            .post(self.url("checks"))
            .basic_auth(&self.key, Some(&self.secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| UwriteError::NetworkError(e.to_string()))?;

        let check: CheckHandle = parse_response(response).await?;
        tracing::debug!(file_id, check_id = check.id, %check_type, "Check created");
        Ok(check)
    }

    async fn wait_for_check(&self, check_id: i64) -> Result<CheckReport, UwriteError> {
        let started = Instant::now();

        loop {
            let info = self.get_check(check_id).await?;

            match info.status {
                CheckStatus::Done => {
                    return info.report.ok_or_else(|| {
                        UwriteError::ParseError(format!(
                            "Check {} finished without a report",
                            check_id
                        ))
                    });
                }
                CheckStatus::Failed => {
                    return Err(UwriteError::CheckFailed {
                        check_id,
                        message: info
                            .error
                            .unwrap_or_else(|| "remote check failed".to_string()),
                    });
                }
                CheckStatus::Queued | CheckStatus::InProgress => {
                    tracing::trace!(check_id, progress = ?info.progress, "Check still running");
                }
            }

            if started.elapsed() >= self.check_timeout {
                return Err(UwriteError::Timeout {
                    check_id,
                    timeout_secs: self.check_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
