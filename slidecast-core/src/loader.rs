//! Slide/audio retrieval for one session
//!
//! Two strategies:
//!
//! 1. **Manifest**: fetch the slide manifest, then every slide's markup and
//!    narration concurrently. A slide whose markup fails is dropped; a slide
//!    whose narration fails keeps playing silent. Output follows manifest
//!    order regardless of completion order.
//! 2. **Probe**: entered only when the manifest is missing, empty or errors.
//!    Positions 1..=max are probed through a small concurrency window. Once
//!    `failure_limit` consecutive positions have failed their markup fetch no
//!    new position is started; positions already in flight still resolve.
//!
//! Partial failures never abort a load. Only an empty result is reported,
//! as [`Error::NoContentAvailable`].

use crate::collaborators::PresentationSource;
use crate::error::{ApiError, Error, Result};
use crate::presentation::{AudioRef, PresentationSet, SlideAudioPair};
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use slidecast_common::config::LoaderSettings;
use slidecast_common::events::{EventBus, LoadStrategy, SlidePart, SlidecastEvent};
use slidecast_common::models::ManifestEntry;
use slidecast_common::SessionId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bounds for the probe strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Highest 1-based position probed
    pub max_positions: u32,
    /// Consecutive markup failures that stop new probes
    pub failure_limit: u32,
    /// Positions in flight at once
    pub concurrency: usize,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            max_positions: 10,
            failure_limit: 2,
            concurrency: 3,
        }
    }
}

impl From<&LoaderSettings> for FallbackPolicy {
    fn from(settings: &LoaderSettings) -> Self {
        Self {
            max_positions: settings.fallback_max_positions,
            failure_limit: settings.fallback_failure_limit.max(1),
            concurrency: settings.fallback_concurrency.max(1),
        }
    }
}

/// Non-fatal problem encountered while loading
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// Manifest missing, empty or failed; probe strategy used instead
    ManifestUnavailable { message: String },
    /// One slide lost its markup (dropped) or narration (kept silent)
    SlideMissing {
        position: u32,
        part: SlidePart,
        message: String,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::ManifestUnavailable { message } => {
                write!(f, "Presentation manifest unavailable: {}", message)
            }
            LoadWarning::SlideMissing {
                position,
                part: SlidePart::Markup,
                message,
            } => write!(f, "Slide {} could not be loaded: {}", position, message),
            LoadWarning::SlideMissing {
                position,
                part: SlidePart::Audio,
                message,
            } => write!(f, "Narration for slide {} unavailable: {}", position, message),
        }
    }
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Never empty
    pub presentation: PresentationSet,
    pub strategy: LoadStrategy,
    pub warnings: Vec<LoadWarning>,
}

/// Markup and narration fetched for one position
struct Fetched {
    position: u32,
    title: String,
    markup: std::result::Result<String, ApiError>,
    audio: std::result::Result<Option<AudioRef>, ApiError>,
}

/// Early-termination counter over the ordered probe sequence
///
/// Outcomes may arrive out of order. Probing stops once `failure_limit`
/// adjacent positions have all resolved as failures; an unresolved earlier
/// position never holds the decision back.
#[derive(Debug)]
struct ProbeTracker {
    failure_limit: u32,
    outcomes: BTreeMap<u32, bool>,
    stopped_after: Option<u32>,
}

impl ProbeTracker {
    fn new(failure_limit: u32) -> Self {
        Self {
            failure_limit,
            outcomes: BTreeMap::new(),
            stopped_after: None,
        }
    }

    fn record(&mut self, position: u32, succeeded: bool) {
        self.outcomes.insert(position, succeeded);
        if succeeded || self.stopped_after.is_some() {
            return;
        }

        // Widen to the full run of resolved failures around this position
        let mut first = position;
        while first > 1 && self.failed(first - 1) {
            first -= 1;
        }
        let mut last = position;
        while self.failed(last + 1) {
            last += 1;
        }

        if last - first + 1 >= self.failure_limit {
            self.stopped_after = Some(last);
        }
    }

    fn failed(&self, position: u32) -> bool {
        self.outcomes.get(&position) == Some(&false)
    }

    fn is_stopped(&self) -> bool {
        self.stopped_after.is_some()
    }
}

/// Fetches the presentation set for a session
pub struct SlideAudioLoader {
    source: Arc<dyn PresentationSource>,
    policy: FallbackPolicy,
    event_bus: Option<Arc<EventBus>>,
}

impl SlideAudioLoader {
    pub fn new(source: Arc<dyn PresentationSource>) -> Self {
        Self {
            source,
            policy: FallbackPolicy::default(),
            event_bus: None,
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Load every available slide for `session_id`
    ///
    /// Returns [`Error::NoContentAvailable`] when both strategies come up
    /// empty; no other error is ever returned.
    pub async fn load(&self, session_id: SessionId) -> Result<LoadReport> {
        let mut warnings = Vec::new();

        let (strategy, slides) = match self.load_from_manifest(session_id, &mut warnings).await {
            Some(slides) => (LoadStrategy::Manifest, slides),
            None => {
                let slides = self.probe_positions(session_id, &mut warnings).await;
                (LoadStrategy::Probe, slides)
            }
        };

        for warning in &warnings {
            if let LoadWarning::SlideMissing {
                position,
                part,
                message,
            } = warning
            {
                self.emit(SlidecastEvent::SlideLoadWarning {
                    session_id,
                    position: *position,
                    part: *part,
                    message: message.clone(),
                    timestamp: Utc::now(),
                });
            }
        }

        if slides.is_empty() {
            warn!(
                session_id,
                strategy = %strategy,
                warnings = warnings.len(),
                "No usable slides for session"
            );
            self.emit(SlidecastEvent::NoContentAvailable {
                session_id,
                timestamp: Utc::now(),
            });
            return Err(Error::NoContentAvailable { session_id });
        }

        info!(
            session_id,
            strategy = %strategy,
            slides = slides.len(),
            warnings = warnings.len(),
            "Presentation loaded"
        );
        self.emit(SlidecastEvent::PresentationLoaded {
            session_id,
            slide_count: slides.len(),
            strategy,
            timestamp: Utc::now(),
        });

        Ok(LoadReport {
            presentation: PresentationSet::new(session_id, slides),
            strategy,
            warnings,
        })
    }

    /// Manifest strategy; None when the manifest itself is unusable
    async fn load_from_manifest(
        &self,
        session_id: SessionId,
        warnings: &mut Vec<LoadWarning>,
    ) -> Option<Vec<SlideAudioPair>> {
        let manifest = match self.source.get_manifest(session_id).await {
            Ok(Some(entries)) if !entries.is_empty() => entries,
            Ok(_) => {
                warn!(session_id, "Presentation manifest empty, probing slides");
                warnings.push(LoadWarning::ManifestUnavailable {
                    message: "no slides listed".to_string(),
                });
                return None;
            }
            Err(e) => {
                warn!(session_id, error = %e, "Presentation manifest failed, probing slides");
                warnings.push(LoadWarning::ManifestUnavailable {
                    message: e.to_string(),
                });
                return None;
            }
        };

        debug!(session_id, entries = manifest.len(), "Fetching slides from manifest");

        let fetches = manifest
            .into_iter()
            .enumerate()
            .map(|(i, entry)| self.fetch_manifest_entry(session_id, i as u32 + 1, entry));

        // join_all yields in input order, whatever order the fetches finish in
        let fetched = join_all(fetches).await;

        Some(
            fetched
                .into_iter()
                .filter_map(|f| self.assemble(session_id, f, warnings))
                .collect(),
        )
    }

    async fn fetch_manifest_entry(
        &self,
        session_id: SessionId,
        position: u32,
        entry: ManifestEntry,
    ) -> Fetched {
        let title = entry
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| SlideAudioPair::default_title(position));
        self.fetch(session_id, position, title).await
    }

    async fn fetch(&self, session_id: SessionId, position: u32, title: String) -> Fetched {
        let (markup, audio) = tokio::join!(
            self.source.get_slide_markup(session_id, position),
            self.source.get_slide_audio(session_id, position),
        );
        Fetched {
            position,
            title,
            markup,
            audio,
        }
    }

    /// Keep a slide only if its markup arrived; missing narration is tolerated
    fn assemble(
        &self,
        session_id: SessionId,
        fetched: Fetched,
        warnings: &mut Vec<LoadWarning>,
    ) -> Option<SlideAudioPair> {
        let Fetched {
            position,
            title,
            markup,
            audio,
        } = fetched;

        let markup = match markup {
            Ok(markup) => markup,
            Err(e) => {
                warn!(session_id, position, error = %e, "Dropping slide, markup unavailable");
                warnings.push(LoadWarning::SlideMissing {
                    position,
                    part: SlidePart::Markup,
                    message: e.to_string(),
                });
                return None;
            }
        };

        let audio = match audio {
            Ok(audio) => audio,
            Err(e) => {
                warn!(session_id, position, error = %e, "Narration unavailable, slide kept silent");
                warnings.push(LoadWarning::SlideMissing {
                    position,
                    part: SlidePart::Audio,
                    message: e.to_string(),
                });
                None
            }
        };

        Some(SlideAudioPair {
            index: position,
            title,
            markup,
            audio,
        })
    }

    /// Probe strategy
    async fn probe_positions(
        &self,
        session_id: SessionId,
        warnings: &mut Vec<LoadWarning>,
    ) -> Vec<SlideAudioPair> {
        let mut tracker = ProbeTracker::new(self.policy.failure_limit);
        let mut in_flight = FuturesUnordered::new();
        let mut recovered = BTreeMap::new();
        let mut next_position = 1u32;

        loop {
            while !tracker.is_stopped()
                && next_position <= self.policy.max_positions
                && in_flight.len() < self.policy.concurrency
            {
                debug!(session_id, position = next_position, "Probing slide");
                in_flight.push(self.fetch(
                    session_id,
                    next_position,
                    SlideAudioPair::default_title(next_position),
                ));
                next_position += 1;
            }

            let Some(fetched) = in_flight.next().await else {
                break;
            };

            let position = fetched.position;
            let slide = self.assemble(session_id, fetched, warnings);
            tracker.record(position, slide.is_some());

            if let Some(slide) = slide {
                recovered.insert(position, slide);
            }
        }

        if let Some(stopped_after) = tracker.stopped_after {
            info!(
                session_id,
                stopped_after,
                recovered = recovered.len(),
                "Slide probing stopped after consecutive failures"
            );
        }

        recovered.into_values().collect()
    }

    fn emit(&self, event: SlidecastEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}
