//! REST client for the agents API.

use agents_core::{AgentGraph, FullProjectDefinition, PaginationInfo};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{CliConfig, Credentials};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{status} {code}: {detail}")]
    Problem {
        status: u16,
        code: String,
        detail: String,
        errors: Vec<String>,
    },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Problem details body returned on every API error.
#[derive(Debug, Deserialize)]
struct ProblemBody {
    status: u16,
    code: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

/// Result of a push: the stored project and whether it was new.
#[derive(Debug)]
pub struct PushOutcome {
    pub project: FullProjectDefinition,
    pub created: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tenant_id: String,
    auth_header: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &CliConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tenant_id: config.tenant_id.clone(),
            auth_header: build_auth_headers(&config.auth)?,
        })
    }

    fn project_full_path(&self, project_id: &str) -> String {
        format!("/tenants/{}/project-full/{}", self.tenant_id, project_id)
    }

    /// PUT the project document. The API creates it when absent.
    pub async fn push_project(
        &self,
        project: &FullProjectDefinition,
    ) -> Result<PushOutcome, ApiClientError> {
        let path = self.project_full_path(&project.id);
        let (status, envelope) = self
            .send_json::<DataEnvelope<FullProjectDefinition>, _>(Method::PUT, &path, Some(project))
            .await?;
        Ok(PushOutcome {
            project: envelope.data,
            created: status == StatusCode::CREATED,
        })
    }

    pub async fn pull_project(&self, project_id: &str) -> Result<FullProjectDefinition, ApiClientError> {
        let path = self.project_full_path(project_id);
        let (_, envelope) = self
            .send_json::<DataEnvelope<FullProjectDefinition>, ()>(Method::GET, &path, None)
            .await?;
        Ok(envelope.data)
    }

    /// Every graph of a project, following pagination.
    pub async fn list_graphs(&self, project_id: &str) -> Result<Vec<AgentGraph>, ApiClientError> {
        let mut graphs = Vec::new();
        let mut page = 1u64;
        loop {
            let path = format!(
                "/tenants/{}/projects/{}/agent-graphs?page={}&limit=100",
                self.tenant_id, project_id, page
            );
            let (_, envelope) = self
                .send_json::<ListEnvelope<AgentGraph>, ()>(Method::GET, &path, None)
                .await?;
            graphs.extend(envelope.data);
            if page >= envelope.pagination.pages {
                break;
            }
            page += 1;
        }
        Ok(graphs)
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, T), ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "Sending request");
        let mut request = self
            .client
            .request(method, url)
            .headers(self.auth_header.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        Ok((status, parse_response(response).await?))
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiClientError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&text)?);
    }
    if let Ok(problem) = serde_json::from_str::<ProblemBody>(&text) {
        return Err(ApiClientError::Problem {
            status: problem.status,
            code: problem.code,
            detail: problem.detail,
            errors: problem.errors.unwrap_or_default(),
        });
    }
    Err(ApiClientError::InvalidResponse(format!(
        "HTTP {}: {}",
        status.as_u16(),
        text
    )))
}

/// API keys go in `X-API-Key`; the bypass secret is a bearer token.
fn build_auth_headers(auth: &Credentials) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(secret) = &auth.bypass_secret {
        let value = format!("Bearer {}", secret);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
