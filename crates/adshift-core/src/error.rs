// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the AdShift bridge.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Codes carried in the `code` field of an error payload.
///
/// Native failures are tagged with the code of the call family they came
/// from, so the caller can tell a failed `start` from a failed `trackEvent`
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoContext,
    InvalidArgs,
    Init,
    Start,
    Stop,
    Config,
    Track,
    Consent,
    DeepLink,
    Decode,
}

impl ErrorCode {
    /// Wire representation used in error payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoContext => "NO_CONTEXT",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::Init => "INIT_ERROR",
            Self::Start => "START_ERROR",
            Self::Stop => "STOP_ERROR",
            Self::Config => "CONFIG_ERROR",
            Self::Track => "TRACK_ERROR",
            Self::Consent => "CONSENT_ERROR",
            Self::DeepLink => "DEEP_LINK_ERROR",
            Self::Decode => "DECODE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Precondition failures (raised before any native call) --
    #[error("{field} is required")]
    InvalidArguments { field: String },

    #[error("Application context not available")]
    NoContext,

    // -- Native SDK failures, normalised at the adapter boundary --
    #[error("{message}")]
    Native {
        code: ErrorCode,
        message: String,
        /// Native-assigned numeric error code, rendered as a string.
        detail: Option<String>,
    },

    // -- Shape errors --
    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Routing --
    #[error("method not implemented: {0}")]
    UnsupportedOperation(String),
}

impl BridgeError {
    pub fn invalid(field: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: field.into(),
        }
    }

    /// Payload code for this error.
    ///
    /// Returns `None` for [`BridgeError::UnsupportedOperation`], which is
    /// surfaced as "not implemented" instead of an error payload.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::InvalidArguments { .. } => Some(ErrorCode::InvalidArgs),
            Self::NoContext => Some(ErrorCode::NoContext),
            Self::Native { code, .. } => Some(*code),
            Self::Decode(_) | Self::Serialization(_) => Some(ErrorCode::Decode),
            Self::UnsupportedOperation(_) => None,
        }
    }

    /// Build the `{code, message, detail}` payload sent back to the caller.
    pub fn payload(&self) -> Option<ErrorPayload> {
        let code = self.code()?;
        let detail = match self {
            Self::Native { detail, .. } => detail.clone(),
            _ => None,
        };
        Some(ErrorPayload {
            code: code.as_str().to_owned(),
            message: self.to_string(),
            detail,
        })
    }
}

/// Error shape delivered over the method channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_payload() {
        let payload = BridgeError::invalid("apiKey").payload().expect("payload");
        assert_eq!(payload.code, "INVALID_ARGS");
        assert_eq!(payload.message, "apiKey is required");
        assert!(payload.detail.is_none());
    }

    #[test]
    fn native_error_keeps_numeric_code_in_detail() {
        let err = BridgeError::Native {
            code: ErrorCode::Track,
            message: "rate limited".into(),
            detail: Some("429".into()),
        };
        let payload = err.payload().expect("payload");
        assert_eq!(payload.code, "TRACK_ERROR");
        assert_eq!(payload.message, "rate limited");
        assert_eq!(payload.detail.as_deref(), Some("429"));
    }

    #[test]
    fn unsupported_operation_has_no_payload() {
        let err = BridgeError::UnsupportedOperation("frobnicate".into());
        assert!(err.code().is_none());
        assert!(err.payload().is_none());
    }
}
