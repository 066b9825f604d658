//! Preparation wizard and its completion signals

mod flow;
mod signal;

pub use flow::{LoadState, PreparationWizard, WizardUpdate, WizardWarning};
pub use signal::{CompletionSignal, CountdownReporter, FixedCountdown, ReadinessPoll};
