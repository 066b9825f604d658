//! # Slidecast Core
//!
//! Preparation and playback of narrated slide presentations:
//! - [`ContentDraft`]: the orderable content outline
//! - [`PreparationWizard`]: staged Select -> Define -> Generate -> Review flow
//! - [`SlideAudioLoader`]: resilient slide/narration retrieval
//! - [`PlaybackController`]: one narration stream kept in step with one slide
//! - [`SessionListView`]: filterable session list feeding the wizard
//!
//! Collaborators (session store, generation trigger, presentation source)
//! are traits in [`collaborators`]; [`http::ApiClient`] implements them over
//! the backend HTTP API.

pub mod collaborators;
pub mod draft;
pub mod error;
pub mod http;
pub mod loader;
pub mod playback;
pub mod presentation;
pub mod sessions;
pub mod wizard;

pub use collaborators::{GenerationTrigger, PresentationSource, SessionStore};
pub use draft::ContentDraft;
pub use error::{ApiError, Error, MediaError, Result};
pub use loader::{FallbackPolicy, LoadReport, LoadWarning, SlideAudioLoader};
pub use playback::{PlayOutcome, PlaybackConfig, PlaybackController, PlaybackState};
pub use presentation::{AudioRef, PresentationSet, SlideAudioPair};
pub use sessions::{SessionListView, SessionSelection, SortKey, StatusFilter};
pub use wizard::{PreparationWizard, WizardUpdate, WizardWarning};
