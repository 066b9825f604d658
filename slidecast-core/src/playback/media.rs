//! Narration media seam
//!
//! The controller never touches a real audio element. It asks a
//! [`MediaBackend`] to open one resource per slide and receives media
//! signals back as [`MediaEvent`]s tagged with the [`BindingId`] they were
//! issued for.

use crate::error::MediaError;
use crate::presentation::AudioRef;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Identity of one bind of a narration resource
///
/// A fresh id is issued every time the controller binds; events carrying an
/// older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding-{}", self.0)
    }
}

/// Monotonic source of binding ids
#[derive(Debug, Default)]
pub(crate) struct BindingIds {
    next: AtomicU64,
}

impl BindingIds {
    pub(crate) fn issue(&self) -> BindingId {
        BindingId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Signal raised by a bound narration resource
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Enough data buffered to start playing
    CanPlay,
    /// Playback position moved; `duration` is None while unknown
    TimeUpdate {
        position: Duration,
        duration: Option<Duration>,
    },
    /// Narration reached its end
    Ended,
    /// Resource failed to load or decode
    Fault(String),
}

/// One opened narration resource
pub trait MediaResource: Send {
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn set_volume(&mut self, volume: f32);

    fn set_muted(&mut self, muted: bool);

    /// Free the resource and any transient handle behind it
    ///
    /// Called exactly once, by [`AudioBinding`] on drop.
    fn release(&mut self);
}

/// Opens narration resources for the controller
pub trait MediaBackend: Send + Sync {
    /// Start buffering `audio`
    ///
    /// The backend reports [`MediaEvent`]s for `binding` back to the
    /// controller through whatever channel the embedding shell wires up.
    fn open(
        &self,
        binding: BindingId,
        audio: &AudioRef,
    ) -> Result<Box<dyn MediaResource>, MediaError>;
}

/// Scoped ownership of the one bound resource
///
/// Dropping the binding releases the resource, so every exit path (index
/// change, reload, teardown) frees it.
pub struct AudioBinding {
    id: BindingId,
    resource: Box<dyn MediaResource>,
}

impl AudioBinding {
    pub(crate) fn new(id: BindingId, resource: Box<dyn MediaResource>) -> Self {
        Self { id, resource }
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub(crate) fn resource(&mut self) -> &mut dyn MediaResource {
        self.resource.as_mut()
    }
}

impl fmt::Debug for AudioBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBinding").field("id", &self.id).finish()
    }
}

impl Drop for AudioBinding {
    fn drop(&mut self) {
        debug!(binding = %self.id, "Releasing narration resource");
        self.resource.release();
    }
}

/// Backend that accepts every resource and produces no sound
///
/// Used by the headless shell. It never raises media events on its own; the
/// caller drives the controller with [`MediaEvent`]s directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

struct SilentResource;

impl MediaResource for SilentResource {
    fn play(&mut self) -> Result<(), MediaError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn release(&mut self) {}
}

impl MediaBackend for SilentBackend {
    fn open(
        &self,
        binding: BindingId,
        audio: &AudioRef,
    ) -> Result<Box<dyn MediaResource>, MediaError> {
        debug!(binding = %binding, audio = ?audio, "Silent backend bound narration");
        Ok(Box::new(SilentResource))
    }
}
