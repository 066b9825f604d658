//! Playback state snapshot

use serde::Serialize;
use slidecast_common::events::PlaybackStatus;
use std::time::Duration;

/// Everything the review screen renders about playback
///
/// Reset whenever a presentation is loaded; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    /// 0-based index into the presentation set
    pub current_index: usize,
    pub status: PlaybackStatus,
    /// 0.0 - 100.0
    pub progress_percent: f64,
    pub is_muted: bool,
    /// 0.0 - 1.0, kept while muted
    pub volume: f32,
    /// Narration for the current slide failed; cleared on index change
    pub load_errored: bool,
    /// Narration for the current slide still buffering
    pub loading: bool,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current_index: 0,
            status: PlaybackStatus::Idle,
            progress_percent: 0.0,
            is_muted: false,
            volume: volume.clamp(0.0, 1.0),
            load_errored: false,
            loading: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Play controls enabled for the current slide
    pub fn can_play(&self) -> bool {
        !self.load_errored && self.status.accepts_play()
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// `position / duration * 100`, clamped; 0 when the duration is zero or unknown
pub fn progress_percent(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => {
            (position.as_secs_f64() / d.as_secs_f64() * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let d = Duration::from_secs(40);
        assert_eq!(progress_percent(Duration::from_secs(10), Some(d)), 25.0);
        assert_eq!(progress_percent(Duration::from_secs(50), Some(d)), 100.0);
        assert_eq!(progress_percent(Duration::from_secs(5), Some(Duration::ZERO)), 0.0);
        assert_eq!(progress_percent(Duration::from_secs(5), None), 0.0);
    }

    #[test]
    fn test_initial_volume_clamped() {
        assert_eq!(PlaybackState::new(3.0).volume, 1.0);
        assert!(!PlaybackState::default().can_play());
    }
}
