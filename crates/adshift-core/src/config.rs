// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

/// Method channel used for request/response calls.
pub const DEFAULT_METHOD_CHANNEL: &str = "com.adshift/sdk";

/// Event channel used for the deep-link stream.
pub const DEFAULT_EVENT_CHANNEL: &str = "com.adshift/sdk/deeplinks";

/// Bridge settings supplied by the host at plugin registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the request/response channel.
    pub method_channel: String,
    /// Name of the deep-link event channel.
    pub event_channel: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Behaviour of the in-memory SDK used on desktop/CI builds.
    pub stub: StubConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            method_channel: DEFAULT_METHOD_CHANNEL.to_owned(),
            event_channel: DEFAULT_EVENT_CHANNEL.to_owned(),
            log_filter: "info".to_owned(),
            stub: StubConfig::default(),
        }
    }
}

/// Knobs for the stub SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Make `start` report a native failure.
    pub fail_start: bool,
    /// Native error code reported alongside a failed `start`.
    pub start_error_code: Option<i32>,
    /// Deferred deep link announced to the stream listener after `start`.
    pub deferred_deep_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"log_filter":"debug"}"#).expect("parse");
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.method_channel, DEFAULT_METHOD_CHANNEL);
        assert_eq!(config.event_channel, DEFAULT_EVENT_CHANNEL);
        assert!(!config.stub.fail_start);
    }
}
