//! Preparation wizard type definitions

use serde::{Deserialize, Serialize};

/// Preparation wizard stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    /// No session selected, no draft exists
    #[default]
    SelectSession,
    /// Instructor edits the content outline
    DefineContent,
    /// Countdown running, generation requested
    GeneratingContent,
    /// Slides loaded (or loading) for review and playback
    ReviewAndPlay,
}

impl WizardStage {
    /// Step number (1-indexed) as shown in the progress header
    pub fn number(&self) -> usize {
        match self {
            WizardStage::SelectSession => 1,
            WizardStage::DefineContent => 2,
            WizardStage::GeneratingContent => 3,
            WizardStage::ReviewAndPlay => 4,
        }
    }

    /// Step title
    pub fn title(&self) -> &'static str {
        match self {
            WizardStage::SelectSession => "Select Session",
            WizardStage::DefineContent => "Define Content",
            WizardStage::GeneratingContent => "Prepare Content",
            WizardStage::ReviewAndPlay => "Validate & Play",
        }
    }

    /// Total number of stages
    pub fn total() -> usize {
        4
    }
}

impl std::fmt::Display for WizardStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}
