//! Playback controller
//!
//! Keeps one narration resource bound to the slide at `current_index` and
//! drives status, progress, auto-advance and volume from two inputs only:
//! explicit user commands and [`MediaEvent`]s for the live binding.
//!
//! # Status flow
//!
//! ```text
//! Idle -> Loading -> Ready <-> Playing <-> Paused
//!            |         |          |
//!            +---------+----------+--> Error (until the index changes)
//!                                 |
//!                                 +--> Ended -> (delay) -> next slide, autoplay
//! ```
//!
//! All handling is synchronous once a command or event is delivered, so the
//! controller always reaches a stable state before the next input.

use super::media::{AudioBinding, BindingId, BindingIds, MediaBackend, MediaEvent};
use super::state::{progress_percent, PlaybackState};
use crate::error::MediaError;
use crate::presentation::{PresentationSet, SlideAudioPair};
use chrono::Utc;
use slidecast_common::config::PlaybackSettings;
use slidecast_common::events::{EventBus, PlaybackStatus, SlideChangeTrigger, SlidecastEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Controller tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Beat between a slide's narration ending and the next slide binding
    pub advance_delay: Duration,
    pub initial_volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_secs(1),
            initial_volume: 1.0,
        }
    }
}

impl From<&PlaybackSettings> for PlaybackConfig {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            advance_delay: Duration::from_millis(settings.advance_delay_ms),
            initial_volume: settings.initial_volume,
        }
    }
}

/// Result of a play request
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    Started,
    /// Request ignored; state unchanged unless the resource itself failed
    Refused { reason: String },
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlayOutcome::Started)
    }
}

/// Drives narration playback for one presentation set
pub struct PlaybackController {
    presentation: PresentationSet,
    backend: Arc<dyn MediaBackend>,
    state: PlaybackState,
    binding: Option<AudioBinding>,
    binding_ids: BindingIds,
    pending_advance: Option<Instant>,
    autoplay_on_ready: bool,
    config: PlaybackConfig,
    event_bus: Option<Arc<EventBus>>,
}

impl PlaybackController {
    /// Take ownership of a presentation and bind its first slide
    pub fn new(
        presentation: PresentationSet,
        backend: Arc<dyn MediaBackend>,
        config: PlaybackConfig,
    ) -> Self {
        Self::build(presentation, backend, config, None)
    }

    pub fn with_event_bus(
        presentation: PresentationSet,
        backend: Arc<dyn MediaBackend>,
        config: PlaybackConfig,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self::build(presentation, backend, config, Some(event_bus))
    }

    fn build(
        presentation: PresentationSet,
        backend: Arc<dyn MediaBackend>,
        config: PlaybackConfig,
        event_bus: Option<Arc<EventBus>>,
    ) -> Self {
        let mut controller = Self {
            presentation,
            backend,
            state: PlaybackState::new(config.initial_volume),
            binding: None,
            binding_ids: BindingIds::default(),
            pending_advance: None,
            autoplay_on_ready: false,
            config,
            event_bus,
        };
        controller.bind_current(SlideChangeTrigger::Initial);
        controller
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn presentation(&self) -> &PresentationSet {
        &self.presentation
    }

    pub fn current_slide(&self) -> Option<&SlideAudioPair> {
        self.presentation.get(self.state.current_index)
    }

    /// Id of the live binding; media events must carry it
    pub fn binding_id(&self) -> Option<BindingId> {
        self.binding.as_ref().map(AudioBinding::id)
    }

    /// When the scheduled auto-advance fires, if one is scheduled
    pub fn pending_auto_advance(&self) -> Option<Instant> {
        self.pending_advance
    }

    pub fn is_last_slide(&self) -> bool {
        Some(self.state.current_index) == self.presentation.last_index()
    }

    // ----- Media events -----

    /// Apply a signal from the media resource
    ///
    /// Events for any binding other than the live one are dropped.
    pub fn handle_media_event(&mut self, binding: BindingId, event: MediaEvent) {
        if self.binding_id() != Some(binding) {
            debug!(binding = %binding, event = ?event, "Ignoring event for released binding");
            return;
        }

        match event {
            MediaEvent::CanPlay => {
                if self.state.status != PlaybackStatus::Loading {
                    return;
                }
                self.set_status(PlaybackStatus::Ready);
                if self.autoplay_on_ready {
                    self.autoplay_on_ready = false;
                    let outcome = self.play();
                    debug!(
                        index = self.state.current_index,
                        outcome = ?outcome,
                        "Auto-play after advance"
                    );
                }
            }
            MediaEvent::TimeUpdate { position, duration } => {
                if self.state.status != PlaybackStatus::Playing {
                    return;
                }
                self.state.progress_percent = progress_percent(position, duration);
                self.emit(SlidecastEvent::PlaybackProgress {
                    index: self.state.current_index,
                    percent: self.state.progress_percent,
                    timestamp: Utc::now(),
                });
            }
            MediaEvent::Ended => self.handle_ended(),
            MediaEvent::Fault(message) => self.fault(MediaError::Open(message)),
        }
    }

    fn handle_ended(&mut self) {
        if self.state.status != PlaybackStatus::Playing {
            debug!(status = %self.state.status, "Ignoring end of narration outside playback");
            return;
        }

        self.state.progress_percent = 100.0;

        if self.is_last_slide() {
            info!(index = self.state.current_index, "Presentation finished");
            self.set_status(PlaybackStatus::Ready);
            return;
        }

        self.set_status(PlaybackStatus::Ended);
        let deadline = Instant::now() + self.config.advance_delay;
        self.pending_advance = Some(deadline);
        debug!(
            index = self.state.current_index,
            delay_ms = self.config.advance_delay.as_millis() as u64,
            "Auto-advance scheduled"
        );
    }

    // ----- Auto-advance -----

    /// Wait for the scheduled auto-advance and apply it
    ///
    /// Never resolves while nothing is scheduled, so it can sit in a
    /// `select!` next to the media event stream. Returns the new index.
    pub async fn auto_advance(&mut self) -> usize {
        let Some(deadline) = self.pending_advance else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;
        self.apply_auto_advance()
    }

    /// Apply the scheduled auto-advance if its deadline has passed
    pub fn advance_if_due(&mut self) -> Option<usize> {
        match self.pending_advance {
            Some(deadline) if Instant::now() >= deadline => Some(self.apply_auto_advance()),
            _ => None,
        }
    }

    fn apply_auto_advance(&mut self) -> usize {
        self.pending_advance = None;
        let Some(last) = self.presentation.last_index() else {
            return self.state.current_index;
        };

        let next = (self.state.current_index + 1).min(last);
        info!(from = self.state.current_index, to = next, "Auto-advancing");
        self.state.current_index = next;
        self.autoplay_on_ready = true;
        self.bind_current(SlideChangeTrigger::AutoAdvance);
        next
    }

    // ----- User commands -----

    /// Start or resume narration
    pub fn play(&mut self) -> PlayOutcome {
        if self.state.load_errored || !self.state.status.accepts_play() {
            let reason = format!("narration is {}", self.state.status);
            debug!(index = self.state.current_index, reason = %reason, "Play refused");
            return PlayOutcome::Refused { reason };
        }

        let Some(binding) = self.binding.as_mut() else {
            return PlayOutcome::Refused {
                reason: "no narration bound".to_string(),
            };
        };

        match binding.resource().play() {
            Ok(()) => {
                self.set_status(PlaybackStatus::Playing);
                PlayOutcome::Started
            }
            Err(e) => {
                let reason = e.to_string();
                self.fault(e);
                PlayOutcome::Refused { reason }
            }
        }
    }

    /// Pause narration; returns false unless it was playing
    pub fn pause(&mut self) -> bool {
        if self.state.status != PlaybackStatus::Playing {
            return false;
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.resource().pause();
        }
        self.set_status(PlaybackStatus::Paused);
        true
    }

    pub fn next(&mut self) -> bool {
        self.jump_to(self.state.current_index.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.jump_to(self.state.current_index.saturating_sub(1))
    }

    /// Move to `index`, clamped to the deck; never auto-plays
    ///
    /// Returns true if the index changed.
    pub fn jump_to(&mut self, index: usize) -> bool {
        let Some(last) = self.presentation.last_index() else {
            return false;
        };
        let target = index.min(last);
        if target == self.state.current_index {
            return false;
        }

        self.pending_advance = None;
        self.autoplay_on_ready = false;
        self.state.current_index = target;
        self.bind_current(SlideChangeTrigger::Manual);
        true
    }

    /// Set volume, clamped to 0.0-1.0; any audible volume unmutes
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.state.volume = volume;
        if volume > 0.0 {
            self.state.is_muted = false;
        }
        self.apply_volume();
    }

    /// Flip mute; the stored volume is untouched
    pub fn toggle_mute(&mut self) {
        self.state.is_muted = !self.state.is_muted;
        self.apply_volume();
    }

    // ----- Binding -----

    /// Release the old resource and bind the slide at `current_index`
    fn bind_current(&mut self, trigger: SlideChangeTrigger) {
        // Old resource goes first so at most one is ever alive
        self.binding = None;
        self.state.progress_percent = 0.0;
        self.state.load_errored = false;

        let index = self.state.current_index;
        let Some(slide) = self.presentation.get(index) else {
            self.set_status(PlaybackStatus::Idle);
            return;
        };

        self.emit(SlidecastEvent::SlideChanged {
            index,
            trigger,
            timestamp: Utc::now(),
        });

        let Some(audio) = slide.audio.as_ref() else {
            self.fault(MediaError::NoNarration);
            return;
        };

        let id = self.binding_ids.issue();
        match self.backend.open(id, audio) {
            Ok(mut resource) => {
                resource.set_volume(self.state.volume);
                resource.set_muted(self.state.is_muted);
                debug!(index, binding = %id, "Narration bound");
                self.binding = Some(AudioBinding::new(id, resource));
                self.set_status(PlaybackStatus::Loading);
            }
            Err(e) => self.fault(e),
        }
    }

    fn fault(&mut self, error: MediaError) {
        warn!(index = self.state.current_index, error = %error, "Narration unavailable");
        self.binding = None;
        self.pending_advance = None;
        self.autoplay_on_ready = false;
        self.state.load_errored = true;
        self.emit(SlidecastEvent::MediaFault {
            index: self.state.current_index,
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        self.set_status(PlaybackStatus::Error);
    }

    fn apply_volume(&mut self) {
        let (volume, muted) = (self.state.volume, self.state.is_muted);
        if let Some(binding) = self.binding.as_mut() {
            binding.resource().set_volume(volume);
            binding.resource().set_muted(muted);
        }
        self.emit(SlidecastEvent::VolumeChanged {
            volume,
            muted,
            timestamp: Utc::now(),
        });
    }

    fn set_status(&mut self, new_status: PlaybackStatus) {
        let old_status = self.state.status;
        self.state.status = new_status;
        self.state.loading = new_status == PlaybackStatus::Loading;
        if old_status == new_status {
            return;
        }

        debug!(
            index = self.state.current_index,
            "Playback status: {} -> {}", old_status, new_status
        );
        self.emit(SlidecastEvent::PlaybackStatusChanged {
            index: self.state.current_index,
            old_status,
            new_status,
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: SlidecastEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("slides", &self.presentation.len())
            .field("state", &self.state)
            .field("binding", &self.binding)
            .field("pending_advance", &self.pending_advance)
            .finish()
    }
}
