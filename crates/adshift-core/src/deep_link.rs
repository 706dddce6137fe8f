// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep-link outcomes and the mapper that flattens them into the uniform
// response mapping delivered to callers.
//
// Both native SDKs report the same information with different field names
// (query params vs. params, `uri` vs. `deeplink`, enum vs. raw-string status).
// Platform adapters fill a `DeepLinkOutcome`; everything downstream only sees
// the flattened `DeepLinkPayload`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Keys under which the five positional sub-parameters are merged into `params`.
pub const SUB_PARAM_KEYS: [&str; 5] = [
    "deep_link_sub1",
    "deep_link_sub2",
    "deep_link_sub3",
    "deep_link_sub4",
    "deep_link_sub5",
];

/// Resolution status of a deep link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeepLinkStatus {
    Found,
    NotFound,
    Error,
}

impl DeepLinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "notFound",
            Self::Error => "error",
        }
    }

    /// Parse the wire spelling. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "found" => Some(Self::Found),
            "notFound" => Some(Self::NotFound),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Why a deep link failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeepLinkErrorKind {
    DecodingError,
    InvalidUrl,
    DeepLinkNotFound,
    NetworkError,
    Timeout,
    /// A native reason this bridge has no dedicated variant for, by its
    /// SCREAMING_SNAKE name.
    Other(String),
    /// Free-text system error; passed to the caller verbatim.
    System(String),
}

impl DeepLinkErrorKind {
    /// Native enum name of the reason, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::DecodingError => Some("DECODING_ERROR"),
            Self::InvalidUrl => Some("INVALID_URL"),
            Self::DeepLinkNotFound => Some("DEEP_LINK_NOT_FOUND"),
            Self::NetworkError => Some("NETWORK_ERROR"),
            Self::Timeout => Some("TIMEOUT"),
            Self::Other(name) => Some(name),
            Self::System(_) => None,
        }
    }

    /// Message shown to the caller: `DEEP_LINK_NOT_FOUND` becomes
    /// "deep link not found"; system messages are left untouched.
    pub fn describe(&self) -> String {
        match self {
            Self::System(message) => message.clone(),
            other => humanize(other.name().unwrap_or_default()),
        }
    }
}

fn humanize(name: &str) -> String {
    name.to_lowercase().replace('_', " ")
}

/// A deep-link resolution as reported by a native SDK, in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepLinkOutcome {
    /// Resolved deep-link URI.
    pub uri: Option<String>,
    /// Raw link value, used when no URI was resolved.
    pub link_value: Option<String>,
    pub query_params: Option<BTreeMap<String, String>>,
    /// Positional sub-parameters `deep_link_sub1` through `deep_link_sub5`.
    pub subs: [Option<String>; 5],
    pub is_deferred: bool,
    pub status: DeepLinkStatus,
    pub error: Option<DeepLinkErrorKind>,
}

impl DeepLinkOutcome {
    pub fn not_found() -> Self {
        Self {
            uri: None,
            link_value: None,
            query_params: None,
            subs: Default::default(),
            is_deferred: false,
            status: DeepLinkStatus::NotFound,
            error: None,
        }
    }

    /// Outcome reported when resolution itself failed inside the bridge or SDK.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: DeepLinkStatus::Error,
            error: Some(DeepLinkErrorKind::System(message.into())),
            ..Self::not_found()
        }
    }

    /// Flatten into the uniform response mapping.
    pub fn to_payload(&self) -> DeepLinkPayload {
        let mut params = self.query_params.clone().unwrap_or_default();
        for (key, sub) in SUB_PARAM_KEYS.iter().zip(&self.subs) {
            if let Some(value) = sub {
                params.insert((*key).to_owned(), value.clone());
            }
        }

        let error_message = match self.status {
            DeepLinkStatus::Error => self.error.as_ref().map(DeepLinkErrorKind::describe),
            _ => None,
        };

        DeepLinkPayload {
            deep_link: self.uri.clone().or_else(|| self.link_value.clone()),
            params: (!params.is_empty()).then_some(params),
            is_deferred: self.is_deferred,
            status: self.status,
            error_message,
        }
    }
}

impl From<DeepLinkPayload> for DeepLinkOutcome {
    /// Lift an already-flattened payload back into an outcome. Sub-parameters
    /// stay inside `params`, so mapping again yields the same payload.
    fn from(payload: DeepLinkPayload) -> Self {
        Self {
            uri: payload.deep_link,
            link_value: None,
            query_params: payload.params,
            subs: Default::default(),
            is_deferred: payload.is_deferred,
            status: payload.status,
            error: payload.error_message.map(DeepLinkErrorKind::System),
        }
    }
}

/// Uniform deep-link response mapping, as delivered on both the direct call
/// and the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLinkPayload {
    pub deep_link: Option<String>,
    /// `None` rather than an empty map when there are no parameters.
    pub params: Option<BTreeMap<String, String>>,
    pub is_deferred: bool,
    pub status: DeepLinkStatus,
    /// Set only when `status` is `error`.
    pub error_message: Option<String>,
}

impl DeepLinkPayload {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn found(uri: &str) -> DeepLinkOutcome {
        DeepLinkOutcome {
            uri: Some(uri.into()),
            status: DeepLinkStatus::Found,
            ..DeepLinkOutcome::not_found()
        }
    }

    #[test]
    fn not_found_serializes_with_explicit_nulls() {
        let value = DeepLinkOutcome::not_found().to_payload().to_value().expect("value");
        assert_eq!(
            value,
            json!({
                "deepLink": null,
                "params": null,
                "isDeferred": false,
                "status": "notFound",
                "errorMessage": null,
            })
        );
    }

    #[test]
    fn subs_merge_over_query_params() {
        let mut outcome = found("myapp://product/42");
        outcome.query_params = Some(BTreeMap::from([
            ("utm_source".to_owned(), "mail".to_owned()),
            ("deep_link_sub2".to_owned(), "from-query".to_owned()),
        ]));
        outcome.subs[0] = Some("a".into());
        outcome.subs[1] = Some("b".into());
        outcome.subs[4] = Some("e".into());

        let params = outcome.to_payload().params.expect("params");
        assert_eq!(params.len(), 4);
        assert_eq!(params["utm_source"], "mail");
        assert_eq!(params["deep_link_sub1"], "a");
        assert_eq!(params["deep_link_sub2"], "b");
        assert_eq!(params["deep_link_sub5"], "e");
    }

    #[test]
    fn empty_query_params_are_absent() {
        let mut outcome = found("myapp://home");
        outcome.query_params = Some(BTreeMap::new());
        assert!(outcome.to_payload().params.is_none());
    }

    #[test]
    fn link_value_is_fallback_for_uri() {
        let mut outcome = DeepLinkOutcome::not_found();
        outcome.status = DeepLinkStatus::Found;
        outcome.link_value = Some("summer_sale".into());
        assert_eq!(outcome.to_payload().deep_link.as_deref(), Some("summer_sale"));

        outcome.uri = Some("myapp://sale".into());
        assert_eq!(outcome.to_payload().deep_link.as_deref(), Some("myapp://sale"));
    }

    #[test]
    fn error_reason_is_humanized() {
        let outcome = DeepLinkOutcome {
            status: DeepLinkStatus::Error,
            error: Some(DeepLinkErrorKind::DeepLinkNotFound),
            ..DeepLinkOutcome::not_found()
        };
        assert_eq!(
            outcome.to_payload().error_message.as_deref(),
            Some("deep link not found")
        );

        let other = DeepLinkErrorKind::Other("SERVER_UNAVAILABLE".into());
        assert_eq!(other.describe(), "server unavailable");
    }

    #[test]
    fn system_message_passes_through_verbatim() {
        let payload = DeepLinkOutcome::failed("The Internet connection appears to be offline.")
            .to_payload();
        assert_eq!(payload.status, DeepLinkStatus::Error);
        assert_eq!(
            payload.error_message.as_deref(),
            Some("The Internet connection appears to be offline.")
        );
    }

    #[test]
    fn error_reason_dropped_unless_status_is_error() {
        let outcome = DeepLinkOutcome {
            error: Some(DeepLinkErrorKind::DeepLinkNotFound),
            ..DeepLinkOutcome::not_found()
        };
        assert!(outcome.to_payload().error_message.is_none());
    }

    #[test]
    fn remapping_is_idempotent() {
        let mut outcome = found("myapp://product/42");
        outcome.is_deferred = true;
        outcome.query_params = Some(BTreeMap::from([("campaign".to_owned(), "x".to_owned())]));
        outcome.subs[2] = Some("c".into());

        let first = outcome.to_payload();
        let second = DeepLinkOutcome::from(first.clone()).to_payload();
        assert_eq!(first, second);

        let failed = DeepLinkOutcome {
            status: DeepLinkStatus::Error,
            error: Some(DeepLinkErrorKind::InvalidUrl),
            ..DeepLinkOutcome::not_found()
        }
        .to_payload();
        assert_eq!(DeepLinkOutcome::from(failed.clone()).to_payload(), failed);
    }

    #[test]
    fn status_wire_names() {
        for status in [DeepLinkStatus::Found, DeepLinkStatus::NotFound, DeepLinkStatus::Error] {
            assert_eq!(DeepLinkStatus::parse(status.as_str()), Some(status));
            assert_eq!(
                serde_json::to_value(status).expect("value"),
                Value::String(status.as_str().into())
            );
        }
        assert_eq!(DeepLinkStatus::parse("FOUND"), None);
    }
}
