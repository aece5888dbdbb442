//! HTTP client for the SkillsMP REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::SkillCatalog;
use crate::credentials::ApiCredential;
use crate::error::{ApiErrorCode, Result, SkillsmpError};
use crate::models::{ApiEnvelope, RemoteSkill, SearchPage, SearchQuery, SemanticResults};

/// Default marketplace API URL
pub const DEFAULT_BASE_URL: &str = "https://skillsmp.com/api/v1";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "SKILLSMP_API_BASE_URL";

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body echoed back when the server sends no envelope.
const MAX_ERROR_BODY: usize = 200;

/// `data` of the details endpoint, bare or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum DetailsData {
    Wrapped { skill: RemoteSkill },
    Bare(RemoteSkill),
}

/// Bearer-authenticated client for the marketplace API.
pub struct SkillsmpClient {
    client: Client,
    base_url: Url,
    credential: ApiCredential,
}

impl SkillsmpClient {
    /// Client against `SKILLSMP_API_BASE_URL`, or the public API.
    pub fn new(credential: ApiCredential) -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_config(credential, &base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_config(credential: ApiCredential, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| SkillsmpError::Validation(format!("Invalid API base URL {base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("skillsmp-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SkillsmpError::from_reqwest)?;

        Ok(Self {
            client,
            base_url,
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SkillsmpError::Validation(format!("Invalid endpoint {path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Only the marketplace itself receives the API key.
    fn is_marketplace_host(&self, url: &Url) -> bool {
        url.host_str() == self.base_url.host_str()
            && url.port_or_known_default() == self.base_url.port_or_known_default()
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path, params)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.credential.key())
            .send()
            .await
            .map_err(SkillsmpError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(SkillsmpError::from_reqwest)?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| SkillsmpError::Decode(format!("{path}: {e}")))?;

        if !envelope.success {
            let error = envelope.error.unwrap_or_default();
            return Err(SkillsmpError::Api {
                code: ApiErrorCode::parse(&error.code),
                status: status.as_u16(),
                message: error.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| SkillsmpError::Decode(format!("{path}: response has no data")))
    }
}

fn error_from_body(status: StatusCode, body: &str) -> SkillsmpError {
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        && let Some(error) = envelope.error
    {
        return SkillsmpError::Api {
            code: ApiErrorCode::parse(&error.code),
            status: status.as_u16(),
            message: error.message,
        };
    }

    let message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    SkillsmpError::Api {
        code: ApiErrorCode::Unknown(format!("HTTP_{}", status.as_u16())),
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            message
        },
    }
}

fn require_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(SkillsmpError::Validation(
            "Search query must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl SkillCatalog for SkillsmpClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        require_query(&query.query)?;
        let params = [
            ("q", query.query.clone()),
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("sortBy", query.sort_by.as_str().to_string()),
        ];
        self.get_envelope("skills/search", &params).await
    }

    async fn semantic_search(&self, query: &str) -> Result<SemanticResults> {
        require_query(query)?;
        self.get_envelope("skills/ai-search", &[("q", query.to_string())])
            .await
    }

    async fn skill_details(&self, id: &str) -> Result<RemoteSkill> {
        if id.trim().is_empty() {
            return Err(SkillsmpError::Validation(
                "Skill id must not be empty".to_string(),
            ));
        }
        let data: DetailsData = self
            .get_envelope("skills/details", &[("id", id.to_string())])
            .await?;
        Ok(match data {
            DetailsData::Wrapped { skill } | DetailsData::Bare(skill) => skill,
        })
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url)
            .map_err(|e| SkillsmpError::Validation(format!("Invalid download URL {url}: {e}")))?;
        debug!(%url, "Downloading archive");

        let mut request = self.client.get(url.clone());
        if self.is_marketplace_host(&url) {
            request = request.bearer_auth(self.credential.key());
        }

        let response = request.send().await.map_err(SkillsmpError::from_reqwest)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SkillsmpError::NotFound(format!(
                "Download failed: file not found (404) at {url}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }

        let bytes = response.bytes().await.map_err(SkillsmpError::from_reqwest)?;
        Ok(bytes.to_vec())
    }
}
