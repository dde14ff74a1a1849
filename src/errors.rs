/*!
 * Error types for the dubwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a synthesis engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error when a synthesis request fails (network, backend crash, timeout)
    #[error("Synthesis request failed: {0}")]
    RequestFailed(String),

    /// Error when the engine response cannot be decoded into audio
    #[error("Failed to decode engine response: {0}")]
    InvalidResponse(String),

    /// Engine returned zero samples where audio was expected
    #[error("Engine returned empty audio for text: {0}")]
    EmptyAudio(String),

    /// The selected strategy needs an operation this engine does not implement
    #[error("Engine '{engine}' does not support the '{operation}' operation")]
    CapabilityNotSupported {
        /// Name of the concrete engine
        engine: String,
        /// The unsupported operation
        operation: String,
    },
}

/// Main application error type covering the dubbing pipeline
#[derive(Error, Debug)]
pub enum DubError {
    /// Invalid input detected before synthesis started
    /// (missing voice reference, unreadable subtitle file, empty cue text)
    #[error("Input error: {0}")]
    Input(String),

    /// Error from the synthesis engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from a time-stretch transform
    #[error("Stretch error: {0}")]
    Stretch(String),

    /// Error while assembling the output buffer
    #[error("Composition error: {0}")]
    Composition(String),
}

impl DubError {
    /// Whether this error is a capability mismatch between the selected
    /// strategy and the engine. Capability errors abort the whole batch
    /// instead of degrading a single cue to silence.
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            DubError::Engine(EngineError::CapabilityNotSupported { .. })
        )
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for DubError {
    fn from(error: anyhow::Error) -> Self {
        Self::Input(error.to_string())
    }
}

impl From<std::io::Error> for DubError {
    fn from(error: std::io::Error) -> Self {
        Self::Input(error.to_string())
    }
}
