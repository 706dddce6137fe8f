// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable native SDK used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use adshift_core::{Consent, DeepLinkOutcome, EventKind, InitOptions, Purchase};

use crate::traits::*;

#[derive(Default)]
pub(crate) struct FakeSdk {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, NativeError>>,
    panics: Mutex<Option<String>>,
    started: AtomicBool,
    purchases: Mutex<Vec<Purchase>>,
    consents: Mutex<Vec<Consent>>,
    events: Mutex<Vec<EventKind>>,
    deep_link: Mutex<Option<DeepLinkOutcome>>,
    listener: Mutex<Option<DeepLinkListener>>,
    registrations: AtomicUsize,
}

impl FakeSdk {
    /// Make every later call to `name` fail with `err`.
    pub fn fail(&self, name: &str, err: NativeError) {
        self.failures.lock().unwrap().insert(name.to_owned(), err);
    }

    pub fn clear_failure(&self, name: &str) {
        self.failures.lock().unwrap().remove(name);
    }

    /// Make the next call to `name` panic.
    pub fn panic_on(&self, name: &str) {
        *self.panics.lock().unwrap() = Some(name.to_owned());
    }

    pub fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::SeqCst);
    }

    pub fn set_deep_link_result(&self, outcome: DeepLinkOutcome) {
        *self.deep_link.lock().unwrap() = Some(outcome);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn purchases(&self) -> Vec<Purchase> {
        self.purchases.lock().unwrap().clone()
    }

    pub fn consents(&self) -> Vec<Consent> {
        self.consents.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Invoke the installed listener the way the native SDK would.
    pub fn fire(&self, outcome: DeepLinkOutcome) {
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener(outcome);
        }
    }

    fn record(&self, name: &str) -> NativeResult<()> {
        self.calls.lock().unwrap().push(name.to_owned());
        let panics = self.panics.lock().unwrap().take_if(|p| p.as_str() == name);
        if panics.is_some() {
            panic!("native {name} exploded");
        }
        match self.failures.lock().unwrap().get(name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl NativeSdk for FakeSdk {
    fn platform_name(&self) -> &str {
        "Fake"
    }
}

#[async_trait]
impl NativeLifecycle for FakeSdk {
    fn initialize(&self, _options: &InitOptions) -> NativeResult<()> {
        self.record("initialize")
    }

    async fn start(&self) -> NativeResult<()> {
        tokio::task::yield_now().await;
        self.record("start")?;
        self.set_started(true);
        Ok(())
    }

    fn stop(&self) -> NativeResult<()> {
        self.record("stop")?;
        self.set_started(false);
        Ok(())
    }

    fn is_started(&self) -> NativeResult<bool> {
        self.record("isStarted")?;
        Ok(self.started.load(Ordering::SeqCst))
    }
}

impl NativeConfig for FakeSdk {
    fn set_debug_enabled(&self, _enabled: bool) -> NativeResult<()> {
        self.record("setDebugEnabled")
    }

    fn set_customer_user_id(&self, _user_id: &str) -> NativeResult<()> {
        self.record("setCustomerUserId")
    }

    fn set_app_open_debounce(&self, _debounce: Duration) -> NativeResult<()> {
        self.record("setAppOpenDebounceMs")
    }

    fn enable_tcf_data_collection(&self, _enabled: bool) -> NativeResult<()> {
        self.record("enableTCFDataCollection")
    }
}

#[async_trait]
impl NativeTracking for FakeSdk {
    async fn track_event(
        &self,
        event: &EventKind,
        _values: Option<&Map<String, Value>>,
    ) -> NativeResult<()> {
        tokio::task::yield_now().await;
        self.record("trackEvent")?;
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn track_purchase(&self, purchase: &Purchase) -> NativeResult<()> {
        tokio::task::yield_now().await;
        self.record("trackPurchase")?;
        self.purchases.lock().unwrap().push(purchase.clone());
        Ok(())
    }
}

impl NativeConsent for FakeSdk {
    fn set_consent_data(&self, consent: Consent) -> NativeResult<()> {
        self.record("setConsentData")?;
        self.consents.lock().unwrap().push(consent);
        Ok(())
    }

    fn refresh_consent(&self) -> NativeResult<()> {
        self.record("refreshConsent")
    }
}

#[async_trait]
impl NativeDeepLinks for FakeSdk {
    async fn handle_deep_link(&self, _url: &str) -> NativeResult<DeepLinkOutcome> {
        self.record("handleDeepLink")?;
        Ok(self
            .deep_link
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(DeepLinkOutcome::not_found))
    }

    fn set_deep_link_listener(&self, listener: DeepLinkListener) -> NativeResult<()> {
        self.record("setDeepLinkListener")?;
        *self.listener.lock().unwrap() = Some(listener);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
