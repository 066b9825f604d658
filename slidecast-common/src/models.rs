//! Session and presentation data model
//!
//! These types mirror the JSON documents exchanged with the session store and
//! the presentation backend. The core only reads sessions and requests partial
//! updates; it never owns the session record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session identifier as issued by the session store
pub type SessionId = i64;

/// Default outline language when a session has none stored
pub const DEFAULT_LANGUAGE: &str = "en";

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Waiting for the instructor to prepare content
    Pending,
    /// Content prepared and accepted by the instructor
    Validated,
    /// Published to learners
    Available,
}

impl SessionStatus {
    /// Sort rank: PENDING first, then VALIDATED, then AVAILABLE
    pub fn rank(&self) -> u8 {
        match self {
            SessionStatus::Pending => 0,
            SessionStatus::Validated => 1,
            SessionStatus::Available => 2,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Pending => write!(f, "PENDING"),
            SessionStatus::Validated => write!(f, "VALIDATED"),
            SessionStatus::Available => write!(f, "AVAILABLE"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(SessionStatus::Pending),
            "VALIDATED" => Ok(SessionStatus::Validated),
            "AVAILABLE" => Ok(SessionStatus::Available),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown session status: {}",
                other
            ))),
        }
    }
}

/// Audience level of a content outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Beginner => write!(f, "beginner"),
            Level::Intermediate => write!(f, "intermediate"),
            Level::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(crate::Error::InvalidInput(format!("unknown level: {}", other))),
        }
    }
}

/// Scheduled session as stored by the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub course_id: i64,
    pub teacher_id: i64,
    #[serde(default)]
    pub group_ids: Vec<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub status: SessionStatus,

    /// Previously chosen outline language
    #[serde(default)]
    pub language: Option<String>,
    /// Previously chosen outline topic
    #[serde(default)]
    pub topic: Option<String>,
    /// Previously chosen outline level
    #[serde(default)]
    pub level: Option<Level>,
    /// Previously chosen outline axes, in slide order
    #[serde(default)]
    pub axes: Option<Vec<String>>,

    /// Whether generation has been requested for this session
    #[serde(default)]
    pub content_generated: bool,
}

/// Partial session update; absent fields are left untouched by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_generated: Option<bool>,
}

/// Course catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
}

/// Learner group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Platform user (teachers are users with the "trainer" role)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Payload sent to the content-generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub language: String,
    pub topic: String,
    pub level: Level,
    pub axes: Vec<String>,
}

/// Acknowledgement returned by the generation trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// One manifest entry describing an available slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub title: Option<String>,
}
