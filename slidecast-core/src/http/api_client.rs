//! Backend HTTP client
//!
//! One reqwest client serves the session admin API, the generation trigger
//! and the presentation endpoints.

use crate::collaborators::{GenerationTrigger, PresentationSource, SessionStore};
use crate::error::ApiError;
use crate::presentation::AudioRef;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slidecast_common::config::TomlConfig;
use slidecast_common::models::{
    ContentRequest, Course, GenerationAck, Group, ManifestEntry, Session, SessionUpdate, User,
};
use slidecast_common::SessionId;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("slidecast/", env!("CARGO_PKG_VERSION"));

/// Header carrying the generation API key
const API_KEY_HEADER: &str = "x-api-key";

/// Manifest body, either `{"slides": [...]}` or `{"slides": {"slides": [...]}}`
#[derive(Debug, Deserialize)]
struct ManifestBody {
    #[serde(default)]
    slides: Option<ManifestSlides>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestSlides {
    Nested { slides: Vec<ManifestEntry> },
    Flat(Vec<ManifestEntry>),
}

impl ManifestBody {
    fn into_entries(self) -> Option<Vec<ManifestEntry>> {
        match self.slides? {
            ManifestSlides::Nested { slides } | ManifestSlides::Flat(slides) => Some(slides),
        }
    }
}

/// HTTP implementation of every collaborator the core consumes
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from loaded configuration
    ///
    /// `cli_url` overrides the environment and the config file.
    pub fn from_config(config: &TomlConfig, cli_url: Option<&str>) -> Result<Self, ApiError> {
        Self::new(
            config.resolve_api_base_url(cli_url),
            config.api_key.clone(),
            config.request_timeout(),
        )
    }

    /// Wrap in an Arc for sharing across the wizard and loader
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let url = response.url().to_string();
            return Err(ApiError::NotFound(url));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");

        let response = self.send(self.http_client.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for ApiClient {
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        self.get_json("/admin/sessions/").await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.get_json("/admin/courses/").await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.get_json("/admin/groups/").await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("/users/get-all").await
    }

    async fn update_session(
        &self,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<Session, ApiError> {
        let url = self.url(&format!("/admin/sessions/{}", id));
        tracing::debug!(url = %url, session_id = id, "PUT session update");

        let response = self.send(self.http_client.put(&url).json(&update)).await?;
        let session: Session = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        tracing::info!(session_id = id, status = %session.status, "Session updated");
        Ok(session)
    }
}

#[async_trait]
impl GenerationTrigger for ApiClient {
    async fn generate(
        &self,
        session_id: SessionId,
        request: ContentRequest,
    ) -> Result<GenerationAck, ApiError> {
        let url = self.url(&format!("/api/presentations/{}/generate/start", session_id));
        tracing::debug!(url = %url, session_id, topic = %request.topic, "POST generation request");

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = self.send(builder).await?;

        // Acknowledgement body is informational; an empty body is still success
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let ack = if body.trim().is_empty() {
            GenerationAck::default()
        } else {
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?
        };

        tracing::info!(session_id, "Generation requested");
        Ok(ack)
    }
}

#[async_trait]
impl PresentationSource for ApiClient {
    async fn get_manifest(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Vec<ManifestEntry>>, ApiError> {
        let path = format!("/api/presentations/{}/slides", session_id);
        match self.get_json::<ManifestBody>(&path).await {
            Ok(body) => Ok(body.into_entries()),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_slide_markup(
        &self,
        session_id: SessionId,
        position: u32,
    ) -> Result<String, ApiError> {
        let url = self.url(&format!(
            "/api/presentations/{}/slide/{}",
            session_id, position
        ));
        let response = self.send(self.http_client.get(&url)).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn get_slide_audio(
        &self,
        session_id: SessionId,
        position: u32,
    ) -> Result<Option<AudioRef>, ApiError> {
        let url = self.url(&format!(
            "/api/presentations/{}/audio/{}",
            session_id, position
        ));

        let response = match self.send(self.http_client.get(&url)).await {
            Ok(response) => response,
            Err(ApiError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if data.is_empty() {
            return Ok(None);
        }

        Ok(Some(AudioRef::Buffer {
            data: Arc::new(data.to_vec()),
            content_type,
        }))
    }
}
