//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Narration playback status for the slide at the current index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No presentation bound
    Idle,
    /// Narration resource bound, buffering
    Loading,
    /// Narration can start playing
    Ready,
    /// Narration playing
    Playing,
    /// Narration paused by the user
    Paused,
    /// Narration finished, waiting to advance to the next slide
    Ended,
    /// Narration could not be bound or decoded; play disabled until the index changes
    Error,
}

impl PlaybackStatus {
    /// Whether `play()` may be accepted from this status
    pub fn accepts_play(&self) -> bool {
        matches!(self, PlaybackStatus::Ready | PlaybackStatus::Paused)
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Loading => write!(f, "loading"),
            PlaybackStatus::Ready => write!(f, "ready"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Ended => write!(f, "ended"),
            PlaybackStatus::Error => write!(f, "error"),
        }
    }
}

/// Why the current slide index changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlideChangeTrigger {
    /// Presentation freshly bound
    Initial,
    /// Narration ended and the controller moved on
    AutoAdvance,
    /// next/previous/jump issued by the user
    Manual,
}
