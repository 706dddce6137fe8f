// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Argument codec: untyped call arguments in, typed `Request` out.
//
// Decoding is pure and always runs before the native SDK is touched, so an
// `InvalidArguments` error guarantees that nothing happened natively.
// Required fields that are absent or mistyped are errors; optional fields
// that are mistyped are treated as absent.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::trace;
use url::Url;

use crate::consent::Consent;
use crate::error::{BridgeError, Result};
use crate::event_kind::EventKind;
use crate::types::{InitOptions, Operation, Purchase, Request};

type Args = Map<String, Value>;

/// Decode the raw arguments of `op` into a typed request.
pub fn decode(op: Operation, args: &Value) -> Result<Request> {
    trace!(operation = %op, "decoding arguments");
    let map = args.as_object();

    let request = match op {
        Operation::Initialize => Request::Initialize(InitOptions {
            api_key: required_str(map, "apiKey")?,
            is_debug: optional_bool(map, "isDebug"),
            app_open_debounce: optional_millis(map, "appOpenDebounceMs"),
            collect_oaid: optional_bool(map, "collectOaid"),
            disable_skan: optional_bool(map, "disableSKAN"),
            wait_for_att_before_start: optional_bool(map, "waitForATTBeforeStart"),
            att_timeout: optional_millis(map, "attTimeoutMs"),
        }),
        Operation::Start => Request::Start,
        Operation::Stop => Request::Stop,
        Operation::IsStarted => Request::IsStarted,
        Operation::SetDebugEnabled => Request::SetDebugEnabled {
            enabled: required_bool(map, "enabled")?,
        },
        Operation::SetCustomerUserId => Request::SetCustomerUserId {
            user_id: required_str(map, "userId")?,
        },
        Operation::SetAppOpenDebounceMs => Request::SetAppOpenDebounce {
            debounce: required_millis(map, "ms")?,
        },
        Operation::TrackEvent => {
            let name = required_str(map, "eventName")?;
            Request::TrackEvent {
                event: EventKind::resolve(&name),
                values: map
                    .and_then(|m| m.get("values"))
                    .and_then(Value::as_object)
                    .cloned(),
            }
        }
        Operation::TrackPurchase => Request::TrackPurchase(Purchase {
            product_id: required_str(map, "productId")?,
            revenue: required_f64(map, "revenue")?,
            currency: required_str(map, "currency")?,
            transaction_id: required_str(map, "transactionId")?,
        }),
        Operation::SetConsentData => {
            let map = map.ok_or_else(|| BridgeError::invalid("consent data"))?;
            Request::SetConsentData(Consent::from_args(map))
        }
        Operation::EnableTcfDataCollection => Request::EnableTcfDataCollection {
            enabled: required_bool(map, "enabled")?,
        },
        Operation::RefreshConsent => Request::RefreshConsent,
        Operation::HandleDeepLink => {
            let url = required_str(map, "url")?;
            let parsed = Url::parse(&url).map_err(|_| BridgeError::invalid("url"))?;
            if is_bare_scheme(&parsed) || url.chars().any(char::is_whitespace) {
                return Err(BridgeError::invalid("url"));
            }
            Request::HandleDeepLink { url }
        }
    };

    Ok(request)
}

fn field<'a>(map: Option<&'a Args>, name: &str) -> Option<&'a Value> {
    map.and_then(|m| m.get(name))
}

/// Present, a string, and not blank.
fn required_str(map: Option<&Args>, name: &str) -> Result<String> {
    match field(map, name).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_owned()),
        _ => Err(BridgeError::invalid(name)),
    }
}

fn required_bool(map: Option<&Args>, name: &str) -> Result<bool> {
    optional_bool(map, name).ok_or_else(|| BridgeError::invalid(name))
}

/// Any JSON number; integers widen to `f64`.
fn required_f64(map: Option<&Args>, name: &str) -> Result<f64> {
    field(map, name)
        .and_then(Value::as_f64)
        .ok_or_else(|| BridgeError::invalid(name))
}

fn required_millis(map: Option<&Args>, name: &str) -> Result<Duration> {
    optional_millis(map, name).ok_or_else(|| BridgeError::invalid(name))
}

fn optional_bool(map: Option<&Args>, name: &str) -> Option<bool> {
    field(map, name).and_then(Value::as_bool)
}

/// Non-negative integer milliseconds. Floats and negatives do not qualify.
fn optional_millis(map: Option<&Args>, name: &str) -> Option<Duration> {
    field(map, name).and_then(Value::as_u64).map(Duration::from_millis)
}

/// `myapp:` parses, but names nothing.
fn is_bare_scheme(url: &Url) -> bool {
    url.cannot_be_a_base() && url.path().is_empty()
}
