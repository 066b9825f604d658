//! In-memory collaborators for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use slidecast_common::models::{
    ContentRequest, Course, GenerationAck, Group, ManifestEntry, SessionUpdate, User,
};
use slidecast_common::{Session, SessionId, SessionStatus};
use slidecast_core::error::{ApiError, MediaError};
use slidecast_core::playback::{BindingId, MediaBackend, MediaResource};
use slidecast_core::presentation::{AudioRef, PresentationSet, SlideAudioPair};
use slidecast_core::{GenerationTrigger, PresentationSource, SessionStore};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn session(id: SessionId, teacher_id: i64, course_id: i64, status: SessionStatus) -> Session {
    Session {
        id,
        course_id,
        teacher_id,
        group_ids: Vec::new(),
        start_date: None,
        status,
        language: None,
        topic: None,
        level: None,
        axes: None,
        content_generated: false,
    }
}

pub fn deck(session_id: SessionId, len: u32) -> PresentationSet {
    let slides = (1..=len)
        .map(|i| SlideAudioPair {
            index: i,
            title: SlideAudioPair::default_title(i),
            markup: format!("<h1>Slide {}</h1>", i),
            audio: Some(AudioRef::Remote(format!("/audio/{}", i))),
        })
        .collect();
    PresentationSet::new(session_id, slides)
}

// ----- Session store -----

#[derive(Default)]
pub struct FakeStore {
    pub sessions: Mutex<Vec<Session>>,
    pub courses: Mutex<Vec<Course>>,
    pub groups: Mutex<Vec<Group>>,
    pub users: Mutex<Vec<User>>,
    pub updates: Mutex<Vec<(SessionId, SessionUpdate)>>,
    pub fail_updates: AtomicBool,
    pub fail_lists: AtomicBool,
}

impl FakeStore {
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        let store = Self::default();
        *store.sessions.lock().unwrap() = sessions;
        store
    }

    pub fn add_course(&self, id: i64, title: &str) {
        self.courses.lock().unwrap().push(Course {
            id,
            title: title.to_string(),
        });
    }

    pub fn add_group(&self, id: i64, name: &str) {
        self.groups.lock().unwrap().push(Group {
            id,
            name: name.to_string(),
            description: None,
        });
    }

    pub fn add_user(&self, id: i64, username: &str) {
        self.users.lock().unwrap().push(User {
            id,
            username: username.to_string(),
            role: Some("trainer".to_string()),
        });
    }

    pub fn recorded_updates(&self) -> Vec<(SessionId, SessionUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    fn check_lists(&self) -> Result<(), ApiError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        self.check_lists()?;
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.check_lists()?;
        Ok(self.courses.lock().unwrap().clone())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.check_lists()?;
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.check_lists()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_session(
        &self,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<Session, ApiError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 500,
                body: "database unavailable".to_string(),
            });
        }

        self.updates.lock().unwrap().push((id, update.clone()));

        let mut sessions = self.sessions.lock().unwrap();
        let stored = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("session {}", id)))?;
        if let Some(status) = update.status {
            stored.status = status;
        }
        if update.language.is_some() {
            stored.language = update.language;
        }
        if update.topic.is_some() {
            stored.topic = update.topic;
        }
        if update.level.is_some() {
            stored.level = update.level;
        }
        if update.axes.is_some() {
            stored.axes = update.axes;
        }
        if let Some(generated) = update.content_generated {
            stored.content_generated = generated;
        }
        Ok(stored.clone())
    }
}

// ----- Generation trigger -----

#[derive(Default)]
pub struct FakeTrigger {
    pub requests: Mutex<Vec<(SessionId, ContentRequest)>>,
    pub fail: AtomicBool,
    /// Time taken to acknowledge each request
    pub delay: Option<Duration>,
}

impl FakeTrigger {
    pub fn failing() -> Self {
        let trigger = Self::default();
        trigger.fail.store(true, Ordering::SeqCst);
        trigger
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationTrigger for FakeTrigger {
    async fn generate(
        &self,
        session_id: SessionId,
        request: ContentRequest,
    ) -> Result<GenerationAck, ApiError> {
        self.requests.lock().unwrap().push((session_id, request));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 502,
                body: "generator offline".to_string(),
            });
        }
        Ok(GenerationAck {
            message: Some("started".to_string()),
        })
    }
}

// ----- Presentation source -----

pub enum ManifestBehavior {
    Entries(Vec<ManifestEntry>),
    Missing,
    Fails,
}

/// Serves slides 1..=deck_len; listed positions fail
pub struct FakeSource {
    pub manifest: Mutex<ManifestBehavior>,
    pub deck_len: u32,
    pub failing_markup: HashSet<u32>,
    pub failing_audio: HashSet<u32>,
    /// Markup latency per position
    pub latency: Option<fn(u32) -> Duration>,
    pub markup_requests: Mutex<Vec<u32>>,
    pub manifest_requests: AtomicUsize,
}

impl FakeSource {
    pub fn new(manifest: ManifestBehavior, deck_len: u32) -> Self {
        Self {
            manifest: Mutex::new(manifest),
            deck_len,
            failing_markup: HashSet::new(),
            failing_audio: HashSet::new(),
            latency: None,
            markup_requests: Mutex::new(Vec::new()),
            manifest_requests: AtomicUsize::new(0),
        }
    }

    /// Manifest listing `len` untitled slides, all served
    pub fn with_manifest(len: u32) -> Self {
        let entries = (0..len).map(|_| ManifestEntry::default()).collect();
        Self::new(ManifestBehavior::Entries(entries), len)
    }

    pub fn failing_markup(mut self, positions: &[u32]) -> Self {
        self.failing_markup.extend(positions);
        self
    }

    pub fn failing_audio(mut self, positions: &[u32]) -> Self {
        self.failing_audio.extend(positions);
        self
    }

    pub fn with_latency(mut self, latency: fn(u32) -> Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_manifest(&self, manifest: ManifestBehavior) {
        *self.manifest.lock().unwrap() = manifest;
    }

    pub fn probed(&self) -> Vec<u32> {
        let mut positions = self.markup_requests.lock().unwrap().clone();
        positions.sort_unstable();
        positions
    }
}

#[async_trait]
impl PresentationSource for FakeSource {
    async fn get_manifest(
        &self,
        _session_id: SessionId,
    ) -> Result<Option<Vec<ManifestEntry>>, ApiError> {
        self.manifest_requests.fetch_add(1, Ordering::SeqCst);
        match &*self.manifest.lock().unwrap() {
            ManifestBehavior::Entries(entries) => Ok(Some(entries.clone())),
            ManifestBehavior::Missing => Ok(None),
            ManifestBehavior::Fails => Err(ApiError::Api {
                status: 500,
                body: "manifest error".to_string(),
            }),
        }
    }

    async fn get_slide_markup(
        &self,
        _session_id: SessionId,
        position: u32,
    ) -> Result<String, ApiError> {
        self.markup_requests.lock().unwrap().push(position);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency(position)).await;
        }
        if self.failing_markup.contains(&position) || position > self.deck_len {
            return Err(ApiError::NotFound(format!("slide {}", position)));
        }
        Ok(format!("<h1>Slide {}</h1>", position))
    }

    async fn get_slide_audio(
        &self,
        _session_id: SessionId,
        position: u32,
    ) -> Result<Option<AudioRef>, ApiError> {
        if self.failing_audio.contains(&position) {
            return Err(ApiError::Network("reset by peer".to_string()));
        }
        if position > self.deck_len {
            return Ok(None);
        }
        Ok(Some(AudioRef::Buffer {
            data: Arc::new(vec![position as u8; 64]),
            content_type: Some("audio/mpeg".to_string()),
        }))
    }
}

// ----- Media backend -----

#[derive(Debug, Default)]
pub struct MediaLog {
    pub opened: Vec<BindingId>,
    pub released: Vec<BindingId>,
    pub plays: usize,
    pub volume: Option<f32>,
    pub muted: Option<bool>,
}

/// Records every call; optionally refuses to play
#[derive(Default)]
pub struct RecordingBackend {
    pub log: Arc<Mutex<MediaLog>>,
    pub fail_play: Arc<AtomicBool>,
}

impl RecordingBackend {
    pub fn live_bindings(&self) -> usize {
        let log = self.log.lock().unwrap();
        log.opened.len() - log.released.len()
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened.len()
    }

    pub fn plays(&self) -> usize {
        self.log.lock().unwrap().plays
    }
}

struct RecordingResource {
    id: BindingId,
    log: Arc<Mutex<MediaLog>>,
    fail_play: Arc<AtomicBool>,
}

impl MediaResource for RecordingResource {
    fn play(&mut self) -> Result<(), MediaError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(MediaError::Playback("decoder error".to_string()));
        }
        self.log.lock().unwrap().plays += 1;
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, volume: f32) {
        self.log.lock().unwrap().volume = Some(volume);
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.lock().unwrap().muted = Some(muted);
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released.push(self.id);
    }
}

impl MediaBackend for RecordingBackend {
    fn open(
        &self,
        binding: BindingId,
        _audio: &AudioRef,
    ) -> Result<Box<dyn MediaResource>, MediaError> {
        self.log.lock().unwrap().opened.push(binding);
        Ok(Box::new(RecordingResource {
            id: binding,
            log: Arc::clone(&self.log),
            fail_play: Arc::clone(&self.fail_play),
        }))
    }
}
