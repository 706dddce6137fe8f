// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core request types for the AdShift bridge.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::consent::Consent;
use crate::error::ErrorCode;
use crate::event_kind::EventKind;

/// Every operation a caller can invoke over the method channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Start,
    Stop,
    IsStarted,
    SetDebugEnabled,
    SetCustomerUserId,
    SetAppOpenDebounceMs,
    TrackEvent,
    TrackPurchase,
    SetConsentData,
    EnableTcfDataCollection,
    RefreshConsent,
    HandleDeepLink,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Self::Initialize,
        Self::Start,
        Self::Stop,
        Self::IsStarted,
        Self::SetDebugEnabled,
        Self::SetCustomerUserId,
        Self::SetAppOpenDebounceMs,
        Self::TrackEvent,
        Self::TrackPurchase,
        Self::SetConsentData,
        Self::EnableTcfDataCollection,
        Self::RefreshConsent,
        Self::HandleDeepLink,
    ];

    /// Method name on the channel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::IsStarted => "isStarted",
            Self::SetDebugEnabled => "setDebugEnabled",
            Self::SetCustomerUserId => "setCustomerUserId",
            Self::SetAppOpenDebounceMs => "setAppOpenDebounceMs",
            Self::TrackEvent => "trackEvent",
            Self::TrackPurchase => "trackPurchase",
            Self::SetConsentData => "setConsentData",
            Self::EnableTcfDataCollection => "enableTCFDataCollection",
            Self::RefreshConsent => "refreshConsent",
            Self::HandleDeepLink => "handleDeepLink",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Code attached to native failures of this operation's call family.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Initialize => ErrorCode::Init,
            Self::Start => ErrorCode::Start,
            Self::Stop => ErrorCode::Stop,
            Self::SetDebugEnabled
            | Self::SetCustomerUserId
            | Self::SetAppOpenDebounceMs
            | Self::EnableTcfDataCollection
            | Self::IsStarted => ErrorCode::Config,
            Self::TrackEvent | Self::TrackPurchase => ErrorCode::Track,
            Self::SetConsentData | Self::RefreshConsent => ErrorCode::Consent,
            Self::HandleDeepLink => ErrorCode::DeepLink,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Options accepted by `initialize`.
///
/// Holds the union of both platforms' flags; each platform adapter applies
/// the ones its SDK understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitOptions {
    pub api_key: String,
    pub is_debug: Option<bool>,
    pub app_open_debounce: Option<Duration>,
    /// Android only.
    pub collect_oaid: Option<bool>,
    /// iOS only.
    pub disable_skan: Option<bool>,
    /// iOS only.
    pub wait_for_att_before_start: Option<bool>,
    /// iOS only.
    pub att_timeout: Option<Duration>,
}

/// A purchase to attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub product_id: String,
    /// Forwarded to the native SDKs as their `price` field.
    pub revenue: f64,
    pub currency: String,
    pub transaction_id: String,
}

/// A fully decoded, type-checked request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Initialize(InitOptions),
    Start,
    Stop,
    IsStarted,
    SetDebugEnabled { enabled: bool },
    SetCustomerUserId { user_id: String },
    SetAppOpenDebounce { debounce: Duration },
    TrackEvent {
        event: EventKind,
        /// `None` when `values` was absent or not an object.
        values: Option<Map<String, Value>>,
    },
    TrackPurchase(Purchase),
    SetConsentData(Consent),
    EnableTcfDataCollection { enabled: bool },
    RefreshConsent,
    HandleDeepLink { url: String },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Initialize(_) => Operation::Initialize,
            Self::Start => Operation::Start,
            Self::Stop => Operation::Stop,
            Self::IsStarted => Operation::IsStarted,
            Self::SetDebugEnabled { .. } => Operation::SetDebugEnabled,
            Self::SetCustomerUserId { .. } => Operation::SetCustomerUserId,
            Self::SetAppOpenDebounce { .. } => Operation::SetAppOpenDebounceMs,
            Self::TrackEvent { .. } => Operation::TrackEvent,
            Self::TrackPurchase(_) => Operation::TrackPurchase,
            Self::SetConsentData(_) => Operation::SetConsentData,
            Self::EnableTcfDataCollection { .. } => Operation::EnableTcfDataCollection,
            Self::RefreshConsent => Operation::RefreshConsent,
            Self::HandleDeepLink { .. } => Operation::HandleDeepLink,
        }
    }
}
