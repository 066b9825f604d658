//! Event types for the slidecast event system
//!
//! Provides shared event definitions and the EventBus used by the wizard,
//! loader and playback controller.

mod loader_types;
mod playback_types;
mod wizard_types;

pub use loader_types::{LoadStrategy, SlidePart};
pub use playback_types::{PlaybackStatus, SlideChangeTrigger};
pub use wizard_types::WizardStage;

use crate::models::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Slidecast event types
///
/// Events are broadcast via EventBus and can be serialized for delivery to a
/// UI shell. Every event carries the time it was raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlidecastEvent {
    /// Wizard moved between stages
    WizardStageChanged {
        /// Session being prepared (None once the wizard is reset)
        session_id: Option<SessionId>,
        old_stage: WizardStage,
        new_stage: WizardStage,
        timestamp: DateTime<Utc>,
    },

    /// Generation countdown ticked
    CountdownTick {
        session_id: SessionId,
        /// Seconds left before the wizard moves to review
        remaining_secs: u32,
        timestamp: DateTime<Utc>,
    },

    /// Draft fields written to the session record
    DraftPersisted {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// Draft fields could not be written (non-fatal)
    DraftPersistFailed {
        session_id: SessionId,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Generation request acknowledged by the backend
    GenerationTriggered {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// Generation request failed (non-fatal, countdown continues)
    GenerationTriggerFailed {
        session_id: SessionId,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One slide lost its markup or narration during loading
    SlideLoadWarning {
        session_id: SessionId,
        /// 1-based slide position
        position: u32,
        part: SlidePart,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Presentation set assembled
    PresentationLoaded {
        session_id: SessionId,
        slide_count: usize,
        strategy: LoadStrategy,
        timestamp: DateTime<Utc>,
    },

    /// Neither loading strategy produced a usable slide
    NoContentAvailable {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// Session marked VALIDATED
    SessionValidated {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// Current slide index changed
    SlideChanged {
        /// 0-based index into the presentation set
        index: usize,
        trigger: SlideChangeTrigger,
        timestamp: DateTime<Utc>,
    },

    /// Playback status changed
    PlaybackStatusChanged {
        index: usize,
        old_status: PlaybackStatus,
        new_status: PlaybackStatus,
        timestamp: DateTime<Utc>,
    },

    /// Narration progress for the current slide
    ///
    /// Emitted on every media time update while playing; not persisted.
    PlaybackProgress {
        index: usize,
        /// 0.0 - 100.0
        percent: f64,
        timestamp: DateTime<Utc>,
    },

    /// Narration for the current slide failed to bind or decode
    MediaFault {
        index: usize,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Volume or mute changed
    VolumeChanged {
        volume: f32,
        muted: bool,
        timestamp: DateTime<Utc>,
    },
}

impl SlidecastEvent {
    /// Event type name, as used for the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            SlidecastEvent::WizardStageChanged { .. } => "WizardStageChanged",
            SlidecastEvent::CountdownTick { .. } => "CountdownTick",
            SlidecastEvent::DraftPersisted { .. } => "DraftPersisted",
            SlidecastEvent::DraftPersistFailed { .. } => "DraftPersistFailed",
            SlidecastEvent::GenerationTriggered { .. } => "GenerationTriggered",
            SlidecastEvent::GenerationTriggerFailed { .. } => "GenerationTriggerFailed",
            SlidecastEvent::SlideLoadWarning { .. } => "SlideLoadWarning",
            SlidecastEvent::PresentationLoaded { .. } => "PresentationLoaded",
            SlidecastEvent::NoContentAvailable { .. } => "NoContentAvailable",
            SlidecastEvent::SessionValidated { .. } => "SessionValidated",
            SlidecastEvent::SlideChanged { .. } => "SlideChanged",
            SlidecastEvent::PlaybackStatusChanged { .. } => "PlaybackStatusChanged",
            SlidecastEvent::PlaybackProgress { .. } => "PlaybackProgress",
            SlidecastEvent::MediaFault { .. } => "MediaFault",
            SlidecastEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }
}

/// Broadcast bus for slidecast events
///
/// Lagging subscribers lose the oldest events; emitters never block.
pub struct EventBus {
    tx: broadcast::Sender<SlidecastEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use slidecast_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SlidecastEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SlidecastEvent,
    ) -> Result<usize, broadcast::error::SendError<SlidecastEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use slidecast_common::events::{EventBus, SlidecastEvent};
    ///
    /// let event_bus = EventBus::new(16);
    ///
    /// // Progress updates - OK if no one is listening
    /// event_bus.emit_lossy(SlidecastEvent::PlaybackProgress {
    ///     index: 0,
    ///     percent: 42.0,
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: SlidecastEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
