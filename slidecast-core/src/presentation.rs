//! Presentation set: ordered slides with their narration

use slidecast_common::SessionId;
use std::fmt;
use std::sync::Arc;

/// Handle to a narration resource
#[derive(Clone, PartialEq)]
pub enum AudioRef {
    /// Resource addressed by URL, streamed by the media backend
    Remote(String),
    /// Resource already fetched into memory
    Buffer {
        data: Arc<Vec<u8>>,
        content_type: Option<String>,
    },
}

impl AudioRef {
    /// Size in bytes for in-memory buffers
    pub fn buffered_len(&self) -> Option<usize> {
        match self {
            AudioRef::Remote(_) => None,
            AudioRef::Buffer { data, .. } => Some(data.len()),
        }
    }
}

impl fmt::Debug for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioRef::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            AudioRef::Buffer { data, content_type } => f
                .debug_struct("Buffer")
                .field("len", &data.len())
                .field("content_type", content_type)
                .finish(),
        }
    }
}

/// One slide and its narration
#[derive(Debug, Clone, PartialEq)]
pub struct SlideAudioPair {
    /// 1-based position in the generated deck
    pub index: u32,
    pub title: String,
    /// Opaque renderable document (HTML as served by the backend)
    pub markup: String,
    /// Narration, absent when it could not be fetched
    pub audio: Option<AudioRef>,
}

impl SlideAudioPair {
    /// Title used when the manifest does not name a slide
    pub fn default_title(position: u32) -> String {
        format!("Slide {}", position)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// Ordered slides for one session, ready for playback
///
/// Built once per load and replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationSet {
    session_id: SessionId,
    slides: Vec<SlideAudioPair>,
}

impl PresentationSet {
    pub fn new(session_id: SessionId, slides: Vec<SlideAudioPair>) -> Self {
        Self { session_id, slides }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slide at a 0-based index
    pub fn get(&self, index: usize) -> Option<&SlideAudioPair> {
        self.slides.get(index)
    }

    /// Highest valid 0-based index, None when empty
    pub fn last_index(&self) -> Option<usize> {
        self.slides.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlideAudioPair> {
        self.slides.iter()
    }

    /// 1-based positions in presentation order
    pub fn positions(&self) -> Vec<u32> {
        self.slides.iter().map(|s| s.index).collect()
    }

    pub fn into_slides(self) -> Vec<SlideAudioPair> {
        self.slides
    }
}
