//! Completion signals for the generating stage
//!
//! The wizard leaves `GeneratingContent` when its signal resolves. Every
//! implementation must eventually resolve: the transition into review is
//! unconditional, only its timing varies.

use crate::collaborators::PresentationSource;
use async_trait::async_trait;
use slidecast_common::SessionId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Sink for seconds-remaining updates
#[derive(Clone)]
pub struct CountdownReporter {
    sink: Arc<dyn Fn(u32) + Send + Sync>,
}

impl CountdownReporter {
    pub fn new(sink: impl Fn(u32) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Reporter that discards every update
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, remaining_secs: u32) {
        (self.sink)(remaining_secs);
    }
}

impl fmt::Debug for CountdownReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CountdownReporter")
    }
}

/// Decides when generated content is worth loading
#[async_trait]
pub trait CompletionSignal: Send + Sync {
    /// Resolve once the review stage may be entered
    ///
    /// Cancellation is the caller's job; implementations just get dropped.
    async fn wait(&self, session_id: SessionId, reporter: CountdownReporter);
}

/// Fixed-length countdown with one-second ticks
#[derive(Debug, Clone, Copy)]
pub struct FixedCountdown {
    secs: u32,
}

impl FixedCountdown {
    pub fn new(secs: u32) -> Self {
        Self { secs }
    }

    pub fn secs(&self) -> u32 {
        self.secs
    }
}

impl Default for FixedCountdown {
    fn default() -> Self {
        Self::new(30)
    }
}

#[async_trait]
impl CompletionSignal for FixedCountdown {
    async fn wait(&self, session_id: SessionId, reporter: CountdownReporter) {
        reporter.report(self.secs);

        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        for remaining in (0..self.secs).rev() {
            ticker.tick().await;
            reporter.report(remaining);
        }

        debug!(session_id, secs = self.secs, "Countdown elapsed");
    }
}

/// Polls the presentation manifest until slides appear
///
/// Bounded by `max_wait`; on timeout it resolves anyway.
pub struct ReadinessPoll {
    source: Arc<dyn PresentationSource>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ReadinessPoll {
    pub fn new(
        source: Arc<dyn PresentationSource>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            source,
            poll_interval: poll_interval.max(Duration::from_millis(100)),
            max_wait,
        }
    }
}

#[async_trait]
impl CompletionSignal for ReadinessPoll {
    async fn wait(&self, session_id: SessionId, reporter: CountdownReporter) {
        let deadline = Instant::now() + self.max_wait;

        loop {
            let now = Instant::now();
            let remaining = deadline.saturating_duration_since(now);
            // Round up so "0" is only reported once the wait is over
            let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            reporter.report(u32::try_from(remaining_secs).unwrap_or(u32::MAX));

            match self.source.get_manifest(session_id).await {
                Ok(Some(entries)) if !entries.is_empty() => {
                    debug!(session_id, slides = entries.len(), "Generated content ready");
                    reporter.report(0);
                    return;
                }
                Ok(_) => debug!(session_id, "Generated content not ready yet"),
                Err(e) => debug!(session_id, error = %e, "Readiness poll failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(session_id, "Readiness wait exhausted, moving on");
                reporter.report(0);
                return;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
