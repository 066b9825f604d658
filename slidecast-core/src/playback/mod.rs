//! Narration playback for a loaded presentation

mod controller;
mod media;
mod state;

pub use controller::{PlayOutcome, PlaybackConfig, PlaybackController};
pub use media::{AudioBinding, BindingId, MediaBackend, MediaEvent, MediaResource, SilentBackend};
pub use state::{progress_percent, PlaybackState};
