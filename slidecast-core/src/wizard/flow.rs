//! Preparation wizard
//!
//! Sequences Select -> Define -> Generate -> Review for one session at a
//! time. Commands (`select_session`, `confirm_content`, `back`, `validate`,
//! `cancel`) change stage synchronously. Background work (countdown, draft
//! persistence, generation trigger, slide loading) reports back through an
//! internal notice channel; the owner applies those notices with
//! [`PreparationWizard::next_update`] or [`PreparationWizard::drain_updates`].
//!
//! Every stage change that abandons background work bumps the run epoch.
//! Notices carry the epoch they were issued under and are discarded when it
//! no longer matches, so late results never land on a stale stage.

use super::signal::{CompletionSignal, CountdownReporter, FixedCountdown};
use crate::collaborators::{GenerationTrigger, SessionStore};
use crate::draft::ContentDraft;
use crate::error::{ApiError, Error, Result};
use crate::loader::{LoadReport, LoadWarning, SlideAudioLoader};
use crate::playback::{MediaBackend, PlaybackConfig, PlaybackController};
use crate::presentation::PresentationSet;
use crate::sessions::SessionSelection;
use chrono::Utc;
use slidecast_common::events::{EventBus, LoadStrategy, SlidecastEvent, WizardStage};
use slidecast_common::{Level, SessionId, SessionStatus};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of background work, tagged with the run that issued it
#[derive(Debug)]
enum Notice {
    Tick {
        epoch: u64,
        remaining_secs: u32,
    },
    CountdownFinished {
        epoch: u64,
    },
    DraftPersisted {
        epoch: u64,
        result: std::result::Result<(), ApiError>,
    },
    GenerationTriggered {
        epoch: u64,
        result: std::result::Result<(), ApiError>,
    },
    Loaded {
        epoch: u64,
        result: Result<LoadReport>,
    },
}

impl Notice {
    fn epoch(&self) -> u64 {
        match self {
            Notice::Tick { epoch, .. }
            | Notice::CountdownFinished { epoch }
            | Notice::DraftPersisted { epoch, .. }
            | Notice::GenerationTriggered { epoch, .. }
            | Notice::Loaded { epoch, .. } => *epoch,
        }
    }
}

/// Non-fatal problem surfaced to the user
#[derive(Debug, Clone, PartialEq)]
pub enum WizardWarning {
    /// Generation request failed; the countdown carries on regardless
    GenerationTriggerFailed(String),
    /// Draft fields could not be written on entering generation
    DraftPersistFailed(String),
    /// Neither loading strategy found a usable slide
    NoContentAvailable,
}

impl fmt::Display for WizardWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardWarning::GenerationTriggerFailed(msg) => {
                write!(f, "Content generation could not be started: {}", msg)
            }
            WizardWarning::DraftPersistFailed(msg) => {
                write!(f, "Session could not be updated: {}", msg)
            }
            WizardWarning::NoContentAvailable => write!(f, "No slides are available yet"),
        }
    }
}

/// What a background notice changed
#[derive(Debug, Clone, PartialEq)]
pub enum WizardUpdate {
    CountdownTick { remaining_secs: u32 },
    DraftPersisted,
    GenerationTriggered,
    Warning(WizardWarning),
    /// Countdown done; now in `ReviewAndPlay` with loading underway
    EnteredReview,
    PresentationLoaded {
        slide_count: usize,
        strategy: LoadStrategy,
    },
}

/// Slide loading progress in the review stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    NoContent,
}

/// Owns the countdown task; dropping it cancels the countdown
struct CountdownGuard {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for CountdownGuard {
    fn drop(&mut self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Loader task aborted when dropped
struct LoadTask(JoinHandle<()>);

impl Drop for LoadTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Staged controller for preparing one session's presentation
pub struct PreparationWizard {
    stage: WizardStage,
    selection: Option<SessionSelection>,
    seed: Option<ContentDraft>,
    draft: Option<ContentDraft>,
    countdown_remaining: Option<u32>,
    playback: Option<PlaybackController>,
    load_state: LoadState,
    load_warnings: Vec<LoadWarning>,
    warnings: Vec<WizardWarning>,

    epoch: u64,
    notice_tx: mpsc::UnboundedSender<Notice>,
    notice_rx: mpsc::UnboundedReceiver<Notice>,
    countdown: Option<CountdownGuard>,
    load_task: Option<LoadTask>,
    pending_generation_results: u8,

    store: Arc<dyn SessionStore>,
    trigger: Arc<dyn GenerationTrigger>,
    loader: Arc<SlideAudioLoader>,
    media: Arc<dyn MediaBackend>,
    signal: Arc<dyn CompletionSignal>,
    playback_config: PlaybackConfig,
    event_bus: Option<Arc<EventBus>>,
}

impl PreparationWizard {
    pub fn new(
        store: Arc<dyn SessionStore>,
        trigger: Arc<dyn GenerationTrigger>,
        loader: Arc<SlideAudioLoader>,
        media: Arc<dyn MediaBackend>,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            stage: WizardStage::SelectSession,
            selection: None,
            seed: None,
            draft: None,
            countdown_remaining: None,
            playback: None,
            load_state: LoadState::NotStarted,
            load_warnings: Vec::new(),
            warnings: Vec::new(),
            epoch: 0,
            notice_tx,
            notice_rx,
            countdown: None,
            load_task: None,
            pending_generation_results: 0,
            store,
            trigger,
            loader,
            media,
            signal: Arc::new(FixedCountdown::default()),
            playback_config: PlaybackConfig::default(),
            event_bus: None,
        }
    }

    pub fn with_completion_signal(mut self, signal: Arc<dyn CompletionSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_playback_config(mut self, config: PlaybackConfig) -> Self {
        self.playback_config = config;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // ----- Accessors -----

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn selection(&self) -> Option<&SessionSelection> {
        self.selection.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.selection.as_ref().map(|s| s.session.id)
    }

    pub fn draft(&self) -> Option<&ContentDraft> {
        self.draft.as_ref()
    }

    /// Seconds left on the countdown while generating
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown_remaining
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn playback(&self) -> Option<&PlaybackController> {
        self.playback.as_ref()
    }

    pub fn playback_mut(&mut self) -> Option<&mut PlaybackController> {
        self.playback.as_mut()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Per-slide problems from the last load
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }

    pub fn warnings(&self) -> &[WizardWarning] {
        &self.warnings
    }

    /// Validate is enabled once at least one slide has loaded
    pub fn can_validate(&self) -> bool {
        self.stage == WizardStage::ReviewAndPlay
            && self
                .playback
                .as_ref()
                .is_some_and(|p| !p.presentation().is_empty())
    }

    // ----- Stage commands -----

    /// Pick a session and seed its draft
    pub fn select_session(&mut self, selection: SessionSelection) -> Result<()> {
        self.require_stage(WizardStage::SelectSession, "select a session")?;

        let seed = ContentDraft::seed(&selection.session, selection.course_title.as_deref());
        info!(
            session_id = selection.session.id,
            topic = %seed.topic,
            axes = seed.axes().len(),
            "Session selected"
        );

        self.draft = Some(seed.clone());
        self.seed = Some(seed);
        self.selection = Some(selection);
        self.transition_to(WizardStage::DefineContent);
        Ok(())
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        self.draft_mut()?.language = language.trim().to_string();
        Ok(())
    }

    pub fn set_topic(&mut self, topic: &str) -> Result<()> {
        self.draft_mut()?.topic = topic.to_string();
        Ok(())
    }

    pub fn set_level(&mut self, level: Level) -> Result<()> {
        self.draft_mut()?.level = level;
        Ok(())
    }

    /// Append an axis; returns false for blank input
    pub fn add_axis(&mut self, axis: &str) -> Result<bool> {
        Ok(self.draft_mut()?.add_axis(axis))
    }

    /// Returns true if the order changed
    pub fn reorder_axes(&mut self, from: &str, to: &str) -> Result<bool> {
        Ok(self.draft_mut()?.reorder_axes(from, to))
    }

    /// Accept the outline and start generating
    ///
    /// Refused with [`Error::Validation`] unless the draft has a topic and at
    /// least one axis; the wizard then stays in `DefineContent`.
    pub fn confirm_content(&mut self) -> Result<()> {
        self.require_stage(WizardStage::DefineContent, "confirm content")?;

        if let Some(draft) = &self.draft {
            if let Err(message) = draft.validate() {
                debug!(session_id = ?self.session_id(), "Content confirmation refused");
                return Err(Error::Validation(message.to_string()));
            }
        }

        self.start_generation()
    }

    /// Step back one stage
    ///
    /// Always refused during `GeneratingContent`, whose countdown spans the
    /// whole stage. `ReviewAndPlay -> GeneratingContent` re-runs preparation.
    pub fn back(&mut self) -> Result<()> {
        match self.stage {
            WizardStage::SelectSession => Err(Error::InvalidState(
                "already at the first stage".to_string(),
            )),
            WizardStage::DefineContent => {
                self.epoch += 1;
                self.selection = None;
                self.draft = None;
                self.seed = None;
                self.transition_to(WizardStage::SelectSession);
                Ok(())
            }
            WizardStage::GeneratingContent => Err(Error::InvalidState(
                "cannot go back while content is generating".to_string(),
            )),
            WizardStage::ReviewAndPlay => {
                info!(session_id = ?self.session_id(), "Re-running content preparation");
                self.start_generation()
            }
        }
    }

    /// Mark the session VALIDATED and return to session selection
    ///
    /// On a store failure the wizard stays in review so the user can retry.
    pub async fn validate(&mut self) -> Result<()> {
        self.require_stage(WizardStage::ReviewAndPlay, "validate")?;
        if !self.can_validate() {
            return Err(Error::InvalidState(
                "no slides loaded for this session".to_string(),
            ));
        }

        let (Some(session_id), Some(draft)) = (self.session_id(), self.draft.as_ref()) else {
            return Err(Error::InvalidState("no session selected".to_string()));
        };

        let mut update = draft.to_session_update();
        update.status = Some(SessionStatus::Validated);
        update.content_generated = Some(true);

        self.store
            .update_session(session_id, update)
            .await
            .map_err(|source| {
                warn!(session_id, error = %source, "Failed to validate session");
                Error::Persist { session_id, source }
            })?;

        info!(session_id, "Session validated");
        self.emit(SlidecastEvent::SessionValidated {
            session_id,
            timestamp: Utc::now(),
        });
        self.reset();
        Ok(())
    }

    /// Abandon preparation from any stage
    ///
    /// Drops the draft, the presentation and all background work at once and
    /// returns to `SelectSession`. Returns the draft as originally seeded from
    /// the session, if one was selected.
    pub fn cancel(&mut self) -> Option<ContentDraft> {
        info!(session_id = ?self.session_id(), stage = %self.stage, "Preparation cancelled");
        let seed = self.seed.clone();
        self.reset();
        seed
    }

    // ----- Background notices -----

    /// Wait for and apply the next background result
    ///
    /// Returns None when nothing is outstanding for the current run.
    pub async fn next_update(&mut self) -> Option<WizardUpdate> {
        loop {
            if !self.has_outstanding_work() {
                return None;
            }
            let notice = self.notice_rx.recv().await?;
            if let Some(update) = self.apply(notice) {
                return Some(update);
            }
        }
    }

    /// Apply every background result already queued, without waiting
    pub fn drain_updates(&mut self) -> Vec<WizardUpdate> {
        let mut updates = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            if let Some(update) = self.apply(notice) {
                updates.push(update);
            }
        }
        updates
    }

    fn has_outstanding_work(&self) -> bool {
        self.countdown.is_some() || self.load_task.is_some() || self.pending_generation_results > 0
    }

    fn apply(&mut self, notice: Notice) -> Option<WizardUpdate> {
        if notice.epoch() != self.epoch {
            debug!(notice = ?notice, current_epoch = self.epoch, "Discarding stale notice");
            return None;
        }

        match notice {
            Notice::Tick { remaining_secs, .. } => {
                self.countdown_remaining = Some(remaining_secs);
                if let Some(session_id) = self.session_id() {
                    self.emit(SlidecastEvent::CountdownTick {
                        session_id,
                        remaining_secs,
                        timestamp: Utc::now(),
                    });
                }
                Some(WizardUpdate::CountdownTick { remaining_secs })
            }
            Notice::CountdownFinished { .. } => {
                self.countdown = None;
                self.countdown_remaining = Some(0);
                self.transition_to(WizardStage::ReviewAndPlay);
                self.start_load();
                Some(WizardUpdate::EnteredReview)
            }
            Notice::DraftPersisted { result, .. } => {
                self.pending_generation_results = self.pending_generation_results.saturating_sub(1);
                let session_id = self.session_id()?;
                match result {
                    Ok(()) => {
                        self.emit(SlidecastEvent::DraftPersisted {
                            session_id,
                            timestamp: Utc::now(),
                        });
                        Some(WizardUpdate::DraftPersisted)
                    }
                    Err(e) => {
                        self.emit(SlidecastEvent::DraftPersistFailed {
                            session_id,
                            message: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        Some(self.warn(WizardWarning::DraftPersistFailed(e.to_string())))
                    }
                }
            }
            Notice::GenerationTriggered { result, .. } => {
                self.pending_generation_results = self.pending_generation_results.saturating_sub(1);
                let session_id = self.session_id()?;
                match result {
                    Ok(()) => {
                        self.emit(SlidecastEvent::GenerationTriggered {
                            session_id,
                            timestamp: Utc::now(),
                        });
                        Some(WizardUpdate::GenerationTriggered)
                    }
                    Err(e) => {
                        self.emit(SlidecastEvent::GenerationTriggerFailed {
                            session_id,
                            message: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        Some(self.warn(WizardWarning::GenerationTriggerFailed(e.to_string())))
                    }
                }
            }
            Notice::Loaded { result, .. } => {
                self.load_task = None;
                match result {
                    Ok(report) => {
                        let slide_count = report.presentation.len();
                        let strategy = report.strategy;
                        self.load_warnings = report.warnings;
                        self.playback = Some(self.build_playback(report.presentation));
                        self.load_state = LoadState::Loaded;
                        Some(WizardUpdate::PresentationLoaded {
                            slide_count,
                            strategy,
                        })
                    }
                    Err(e) => {
                        debug!(error = %e, "Load produced no presentation");
                        self.load_state = LoadState::NoContent;
                        Some(self.warn(WizardWarning::NoContentAvailable))
                    }
                }
            }
        }
    }

    // ----- Internals -----

    fn start_generation(&mut self) -> Result<()> {
        let (Some(session_id), Some(draft)) = (self.session_id(), self.draft.as_ref()) else {
            return Err(Error::InvalidState("no session selected".to_string()));
        };
        let request = draft.to_request();
        let mut update = draft.to_session_update();
        update.content_generated = Some(true);

        self.abandon_run();
        self.transition_to(WizardStage::GeneratingContent);

        let epoch = self.epoch;

        // Countdown
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let signal = Arc::clone(&self.signal);
        let tick_tx = self.notice_tx.clone();
        let reporter = CountdownReporter::new(move |remaining_secs| {
            let _ = tick_tx.send(Notice::Tick {
                epoch,
                remaining_secs,
            });
        });
        let done_tx = self.notice_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(session_id, "Countdown cancelled");
                }
                _ = signal.wait(session_id, reporter) => {
                    let _ = done_tx.send(Notice::CountdownFinished { epoch });
                }
            }
        });
        self.countdown = Some(CountdownGuard { token, handle });

        // Persist and trigger side by side; neither gates the countdown and
        // each reports as soon as it settles
        let store = Arc::clone(&self.store);
        let persist_tx = self.notice_tx.clone();
        tokio::spawn(async move {
            let result = store.update_session(session_id, update).await.map(|_| ());
            if let Err(e) = &result {
                warn!(session_id, error = %e, "Failed to persist content draft");
            }
            let _ = persist_tx.send(Notice::DraftPersisted { epoch, result });
        });

        let trigger = Arc::clone(&self.trigger);
        let trigger_tx = self.notice_tx.clone();
        tokio::spawn(async move {
            let result = trigger.generate(session_id, request).await.map(|_| ());
            if let Err(e) = &result {
                warn!(session_id, error = %e, "Generation trigger failed");
            }
            let _ = trigger_tx.send(Notice::GenerationTriggered { epoch, result });
        });
        self.pending_generation_results = 2;

        info!(session_id, "Content generation started");
        Ok(())
    }

    fn start_load(&mut self) {
        let Some(session_id) = self.session_id() else {
            return;
        };

        self.playback = None;
        self.load_warnings.clear();
        self.load_state = LoadState::Loading;

        let loader = Arc::clone(&self.loader);
        let tx = self.notice_tx.clone();
        let epoch = self.epoch;
        let handle = tokio::spawn(async move {
            let result = loader.load(session_id).await;
            let _ = tx.send(Notice::Loaded { epoch, result });
        });
        self.load_task = Some(LoadTask(handle));
        debug!(session_id, "Loading presentation");
    }

    fn build_playback(&self, presentation: PresentationSet) -> PlaybackController {
        let media = Arc::clone(&self.media);
        match &self.event_bus {
            Some(bus) => PlaybackController::with_event_bus(
                presentation,
                media,
                self.playback_config,
                Arc::clone(bus),
            ),
            None => PlaybackController::new(presentation, media, self.playback_config),
        }
    }

    /// Drop background work and review state; the selection stays
    fn abandon_run(&mut self) {
        self.epoch += 1;
        self.countdown = None;
        self.load_task = None;
        self.pending_generation_results = 0;
        self.countdown_remaining = None;
        self.playback = None;
        self.load_state = LoadState::NotStarted;
        self.load_warnings.clear();
        self.warnings.clear();
    }

    fn reset(&mut self) {
        self.abandon_run();
        self.selection = None;
        self.draft = None;
        self.seed = None;
        self.transition_to(WizardStage::SelectSession);
    }

    fn warn(&mut self, warning: WizardWarning) -> WizardUpdate {
        warn!(session_id = ?self.session_id(), "{}", warning);
        self.warnings.push(warning.clone());
        WizardUpdate::Warning(warning)
    }

    fn draft_mut(&mut self) -> Result<&mut ContentDraft> {
        self.require_stage(WizardStage::DefineContent, "edit the draft")?;
        self.draft
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no draft to edit".to_string()))
    }

    fn require_stage(&self, expected: WizardStage, action: &str) -> Result<()> {
        if self.stage != expected {
            return Err(Error::InvalidState(format!(
                "cannot {} during {}",
                action, self.stage
            )));
        }
        Ok(())
    }

    fn transition_to(&mut self, new_stage: WizardStage) {
        let old_stage = self.stage;
        self.stage = new_stage;
        if old_stage == new_stage {
            return;
        }

        info!(
            session_id = ?self.session_id(),
            "Wizard stage: {} -> {}", old_stage, new_stage
        );
        self.emit(SlidecastEvent::WizardStageChanged {
            session_id: self.session_id(),
            old_stage,
            new_stage,
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: SlidecastEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

impl fmt::Debug for PreparationWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparationWizard")
            .field("stage", &self.stage)
            .field("session_id", &self.session_id())
            .field("epoch", &self.epoch)
            .field("load_state", &self.load_state)
            .finish()
    }
}
