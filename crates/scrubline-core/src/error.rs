use thiserror::Error;

use crate::trigger::TriggerHandle;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeline composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("Invalid easing: {0}")]
    InvalidEasing(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Trigger not found: {0}")]
    TriggerNotFound(TriggerHandle),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Authoring mistakes caught while a timeline is composed.
///
/// These are never repaired silently; the caller has to fix the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("segment {segment} animates properties but has no targets")]
    EmptyTargets { segment: usize },

    #[error("segment {segment} has negative duration {duration}")]
    NegativeDuration { segment: usize, duration: f64 },

    #[error("segment {segment} changes properties over zero duration")]
    ZeroLengthChange { segment: usize },

    #[error("segment {segment} has a non-finite value for '{property}'")]
    NonFiniteValue { segment: usize, property: String },

    #[error("segment {segment} has no starting value for '{property}' on '{element}'")]
    UnresolvedFrom {
        segment: usize,
        element: String,
        property: String,
    },

    #[error("segment {segment} has negative stagger {stagger}")]
    NegativeStagger { segment: usize, stagger: f64 },

    #[error("segment {segment} resolves to negative start {start}")]
    NegativeStart { segment: usize, start: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
