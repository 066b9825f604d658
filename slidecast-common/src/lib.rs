//! # Slidecast Common Library
//!
//! Shared code for the slidecast workspace including:
//! - Session, course and presentation data model
//! - Event types (SlidecastEvent enum) and the EventBus
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::{Level, Session, SessionId, SessionStatus};
