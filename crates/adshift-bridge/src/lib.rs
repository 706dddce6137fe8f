// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! AdShift bridge: method and event channel plumbing over a native SDK.
//!
//! The host application injects a native SDK handle (`NativeSdk`); the
//! `android` and `ios` modules translate the canonical capability traits to
//! each platform SDK's vocabulary, and `stub` backs desktop and CI runs.
//! `AdshiftPlugin` is the entry point the host's channel layer talks to.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod adapter;
pub mod android;
pub mod channel;
pub mod delivery;
pub mod dispatcher;
pub mod ios;
pub mod plugin;
pub mod stream;
pub mod stub;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::SdkAdapter;
pub use channel::{EventSink, MethodCall, MethodResponse, PendingCall};
pub use delivery::{DeliveryContext, DeliveryLoop};
pub use dispatcher::Dispatcher;
pub use plugin::AdshiftPlugin;
pub use stream::DeepLinkStream;
pub use stub::{StubSdk, StubState};
pub use traits::{DeepLinkListener, NativeError, NativeResult, NativeSdk};

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
