// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AdShift bridge — protocol definition shared by every platform adapter.
//
// Everything in this crate is pure: decoding call arguments, resolving event
// names, building consent values and flattening deep-link outcomes never
// touches native SDK state.

pub mod codec;
pub mod config;
pub mod consent;
pub mod deep_link;
pub mod error;
pub mod event_kind;
pub mod types;

pub use config::BridgeConfig;
pub use consent::Consent;
pub use deep_link::{DeepLinkErrorKind, DeepLinkOutcome, DeepLinkPayload, DeepLinkStatus};
pub use error::{BridgeError, ErrorCode, ErrorPayload};
pub use event_kind::EventKind;
pub use types::*;
