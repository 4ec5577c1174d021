use async_trait::async_trait;
use http::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::config::{BoardConfig, ConfigError};
use crate::models::{ActivityCatalog, ErrorBody, SignupResponse};

#[derive(Debug, Clone, Error)]
pub enum ActivitiesApiError {
    #[error("activities service unreachable at {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("activities service answered {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("activities service response from {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },
}

impl ActivitiesApiError {
    /// Server-supplied `detail`, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ActivitiesApiError::Status { detail, .. } => {
                detail.as_deref().filter(|d| !d.trim().is_empty())
            }
            _ => None,
        }
    }
}

/// The activities service as seen by the board.
#[async_trait]
pub trait ActivitiesApi: Send + Sync {
    async fn list_activities(&self) -> Result<ActivityCatalog, ActivitiesApiError>;

    async fn signup(&self, activity: &str, email: &str)
        -> Result<SignupResponse, ActivitiesApiError>;

    async fn unregister(&self, activity: &str, email: &str) -> Result<(), ActivitiesApiError>;
}

pub struct HttpActivitiesApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpActivitiesApi {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BoardConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.api_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::new(config.activities_api_url.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ActivitiesApi for HttpActivitiesApi {
    async fn list_activities(&self) -> Result<ActivityCatalog, ActivitiesApiError> {
        let url = list_url(&self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_failed(&url, e))?;
        read_success_json(&url, resp).await
    }

    async fn signup(
        &self,
        activity: &str,
        email: &str,
    ) -> Result<SignupResponse, ActivitiesApiError> {
        let url = signup_url(&self.base_url, activity, email);
        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| transport_failed(&url, e))?;
        read_success_json(&url, resp).await
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<(), ActivitiesApiError> {
        let url = unregister_url(&self.base_url, activity, email);
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| transport_failed(&url, e))?;
        ensure_success(&url, resp).await?;
        Ok(())
    }
}

/// Passes 2xx responses through; anything else becomes `Status` with the
/// server's `detail` when the body carries one.
async fn ensure_success(
    url: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ActivitiesApiError> {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp.json::<ErrorBody>().await.ok().and_then(|b| b.detail);
    warn!("Activities service non-OK {} for {}", status, url);
    Err(ActivitiesApiError::Status { status, detail })
}

async fn read_success_json<T: DeserializeOwned>(
    url: &str,
    resp: reqwest::Response,
) -> Result<T, ActivitiesApiError> {
    let resp = ensure_success(url, resp).await?;
    resp.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            parse_failed(url, e)
        } else {
            transport_failed(url, e)
        }
    })
}

fn transport_failed(url: &str, err: impl ToString) -> ActivitiesApiError {
    ActivitiesApiError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn parse_failed(url: &str, err: impl ToString) -> ActivitiesApiError {
    ActivitiesApiError::Parse {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

pub(crate) fn list_url(base_url: &str) -> String {
    format!("{}/activities", base_url)
}

pub(crate) fn signup_url(base_url: &str, activity: &str, email: &str) -> String {
    format!(
        "{}/activities/{}/signup?email={}",
        base_url,
        encode_component(activity),
        encode_component(email)
    )
}

pub(crate) fn unregister_url(base_url: &str, activity: &str, email: &str) -> String {
    format!(
        "{}/activities/{}/signup/{}",
        base_url,
        encode_component(activity),
        encode_component(email)
    )
}

/// Percent-encodes everything outside `A-Z a-z 0-9 - _ . ! ~ * ' ( )`,
/// the same set a browser's `encodeURIComponent` leaves alone.
pub(crate) fn encode_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let keep = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if keep {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}
