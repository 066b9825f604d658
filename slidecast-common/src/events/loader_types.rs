//! Slide/audio loading type definitions

use serde::{Deserialize, Serialize};

/// Which retrieval strategy produced a presentation set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Manifest fetched, every entry fetched concurrently
    Manifest,
    /// Manifest unavailable, positions probed until consecutive failures
    Probe,
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStrategy::Manifest => write!(f, "manifest"),
            LoadStrategy::Probe => write!(f, "probe"),
        }
    }
}

/// Which part of a slide could not be fetched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlidePart {
    Markup,
    Audio,
}
