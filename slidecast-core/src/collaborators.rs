//! Collaborator contracts consumed by the core
//!
//! The session store, the generation trigger and the presentation data
//! source live outside this crate. `crate::http::ApiClient` implements all
//! three against the HTTP backend; tests substitute in-memory fakes.

use crate::error::ApiError;
use crate::presentation::AudioRef;
use async_trait::async_trait;
use slidecast_common::models::{
    ContentRequest, Course, GenerationAck, Group, ManifestEntry, Session, SessionUpdate, User,
};
use slidecast_common::SessionId;

/// Session records and the catalogs needed to display them
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError>;

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError>;

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// Apply a partial update; returns the stored record
    async fn update_session(
        &self,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<Session, ApiError>;
}

/// Starts slide and narration generation for a session
#[async_trait]
pub trait GenerationTrigger: Send + Sync {
    async fn generate(
        &self,
        session_id: SessionId,
        request: ContentRequest,
    ) -> Result<GenerationAck, ApiError>;
}

/// Generated slides and narration for a session
///
/// Positions are 1-based.
#[async_trait]
pub trait PresentationSource: Send + Sync {
    /// Ordered slide manifest; None when the backend has no manifest
    async fn get_manifest(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Vec<ManifestEntry>>, ApiError>;

    /// Renderable markup for one slide
    async fn get_slide_markup(
        &self,
        session_id: SessionId,
        position: u32,
    ) -> Result<String, ApiError>;

    /// Narration for one slide; None when the slide has none
    async fn get_slide_audio(
        &self,
        session_id: SessionId,
        position: u32,
    ) -> Result<Option<AudioRef>, ApiError>;
}
