// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capability traits for the native attribution SDK.
//
// These speak the canonical vocabulary from `adshift-core`. The `android` and
// `ios` modules implement them by translating to each SDK's own types; tests
// and desktop builds substitute fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use adshift_core::{Consent, DeepLinkOutcome, EventKind, InitOptions, Purchase};

/// Failure reported by (or on behalf of) the native SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// The SDK raised or reported an error.
    #[error("{message}")]
    Raised {
        message: String,
        /// Numeric code assigned by the native SDK, when it reports one.
        code: Option<i32>,
    },

    #[error("Application context not available")]
    NoContext,

    #[error("SDK is not initialized")]
    NotInitialized,
}

impl NativeError {
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
            code: Some(code),
        }
    }
}

pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Callback the native SDK invokes for every deep-link resolution, including
/// deferred ones discovered after a cold start. May be called from any thread.
pub type DeepLinkListener = Arc<dyn Fn(DeepLinkOutcome) + Send + Sync>;

/// Complete native SDK surface the bridge relies on.
pub trait NativeSdk:
    NativeLifecycle + NativeConfig + NativeTracking + NativeConsent + NativeDeepLinks
{
    /// Human-readable platform name (e.g. "Android", "iOS").
    fn platform_name(&self) -> &str;
}

/// SDK setup and session control.
#[async_trait]
pub trait NativeLifecycle: Send + Sync {
    /// Apply the API key and whichever optional flags this platform supports.
    fn initialize(&self, options: &InitOptions) -> NativeResult<()>;

    /// Start the SDK session. Completes when the native start request does.
    async fn start(&self) -> NativeResult<()>;

    fn stop(&self) -> NativeResult<()>;

    fn is_started(&self) -> NativeResult<bool>;
}

/// Runtime configuration setters.
pub trait NativeConfig: Send + Sync {
    fn set_debug_enabled(&self, enabled: bool) -> NativeResult<()>;

    fn set_customer_user_id(&self, user_id: &str) -> NativeResult<()>;

    fn set_app_open_debounce(&self, debounce: Duration) -> NativeResult<()>;

    fn enable_tcf_data_collection(&self, enabled: bool) -> NativeResult<()>;
}

/// In-app event and purchase tracking.
#[async_trait]
pub trait NativeTracking: Send + Sync {
    /// `values` is `None` when the caller sent none.
    async fn track_event(
        &self,
        event: &EventKind,
        values: Option<&Map<String, Value>>,
    ) -> NativeResult<()>;

    async fn track_purchase(&self, purchase: &Purchase) -> NativeResult<()>;
}

/// Consent handling.
pub trait NativeConsent: Send + Sync {
    fn set_consent_data(&self, consent: Consent) -> NativeResult<()>;

    fn refresh_consent(&self) -> NativeResult<()>;
}

/// Deep-link resolution.
#[async_trait]
pub trait NativeDeepLinks: Send + Sync {
    /// Resolve a single link on behalf of a direct call.
    async fn handle_deep_link(&self, url: &str) -> NativeResult<DeepLinkOutcome>;

    /// Install the listener for deep-link notifications. The native SDKs hold a
    /// single listener; installing again replaces it.
    fn set_deep_link_listener(&self, listener: DeepLinkListener) -> NativeResult<()>;
}
