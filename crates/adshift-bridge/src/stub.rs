// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory SDK for desktop/CI builds where the native mobile SDKs are
// unavailable.
//
// State transitions mirror the real SDKs closely enough to drive the bridge
// end to end: calls before `initialize` fail with `NotInitialized`, `start`
// can be made to fail through `StubConfig`, and deep links resolve to their
// own query parameters.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use adshift_core::config::StubConfig;
use adshift_core::deep_link::SUB_PARAM_KEYS;
use adshift_core::{Consent, DeepLinkOutcome, DeepLinkStatus, EventKind, InitOptions, Purchase};

use crate::lock;
use crate::traits::*;

/// Everything the stub has been told so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StubState {
    pub api_key: Option<String>,
    pub started: bool,
    pub debug: bool,
    pub customer_user_id: Option<String>,
    pub app_open_debounce: Option<Duration>,
    pub tcf_enabled: bool,
    pub consent: Option<Consent>,
    /// Events and purchases accepted.
    pub tracked: usize,
}

/// Native SDK stand-in returned on non-mobile platforms.
pub struct StubSdk {
    config: StubConfig,
    state: Mutex<StubState>,
    listener: Mutex<Option<DeepLinkListener>>,
}

impl StubSdk {
    pub fn new(config: StubConfig) -> Self {
        Self {
            config,
            state: Mutex::new(StubState::default()),
            listener: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> StubState {
        lock(&self.state).clone()
    }

    fn ensure_initialized(&self) -> NativeResult<()> {
        if lock(&self.state).api_key.is_some() {
            Ok(())
        } else {
            Err(NativeError::NotInitialized)
        }
    }

    fn announce(&self, outcome: DeepLinkOutcome) {
        let listener = lock(&self.listener).clone();
        match listener {
            Some(listener) => listener(outcome),
            None => debug!("stub: no deep-link listener registered"),
        }
    }
}

impl Default for StubSdk {
    fn default() -> Self {
        Self::new(StubConfig::default())
    }
}

impl NativeSdk for StubSdk {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

#[async_trait]
impl NativeLifecycle for StubSdk {
    fn initialize(&self, options: &InitOptions) -> NativeResult<()> {
        let mut state = lock(&self.state);
        state.api_key = Some(options.api_key.clone());
        state.debug = options.is_debug.unwrap_or(state.debug);
        if options.app_open_debounce.is_some() {
            state.app_open_debounce = options.app_open_debounce;
        }
        info!(debug = state.debug, "stub SDK initialised");
        Ok(())
    }

    async fn start(&self) -> NativeResult<()> {
        self.ensure_initialized()?;
        if self.config.fail_start {
            warn!("stub: start configured to fail");
            return Err(NativeError::Raised {
                message: "Stub SDK refused to start".to_owned(),
                code: self.config.start_error_code,
            });
        }

        lock(&self.state).started = true;
        info!("stub SDK started");

        if let Some(link) = &self.config.deferred_deep_link {
            let mut outcome = resolve_url(link);
            outcome.is_deferred = true;
            self.announce(outcome);
        }
        Ok(())
    }

    fn stop(&self) -> NativeResult<()> {
        lock(&self.state).started = false;
        info!("stub SDK stopped");
        Ok(())
    }

    fn is_started(&self) -> NativeResult<bool> {
        Ok(lock(&self.state).started)
    }
}

impl NativeConfig for StubSdk {
    fn set_debug_enabled(&self, enabled: bool) -> NativeResult<()> {
        lock(&self.state).debug = enabled;
        Ok(())
    }

    fn set_customer_user_id(&self, user_id: &str) -> NativeResult<()> {
        lock(&self.state).customer_user_id = Some(user_id.to_owned());
        debug!(user_id, "stub: customer user id set");
        Ok(())
    }

    fn set_app_open_debounce(&self, debounce: Duration) -> NativeResult<()> {
        lock(&self.state).app_open_debounce = Some(debounce);
        Ok(())
    }

    fn enable_tcf_data_collection(&self, enabled: bool) -> NativeResult<()> {
        lock(&self.state).tcf_enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl NativeTracking for StubSdk {
    async fn track_event(
        &self,
        event: &EventKind,
        values: Option<&Map<String, Value>>,
    ) -> NativeResult<()> {
        self.ensure_initialized()?;
        lock(&self.state).tracked += 1;
        info!(event = %event, values = values.map_or(0, Map::len), "stub: event tracked");
        Ok(())
    }

    async fn track_purchase(&self, purchase: &Purchase) -> NativeResult<()> {
        self.ensure_initialized()?;
        lock(&self.state).tracked += 1;
        info!(
            product_id = %purchase.product_id,
            revenue = purchase.revenue,
            currency = %purchase.currency,
            "stub: purchase tracked"
        );
        Ok(())
    }
}

impl NativeConsent for StubSdk {
    fn set_consent_data(&self, consent: Consent) -> NativeResult<()> {
        lock(&self.state).consent = Some(consent);
        Ok(())
    }

    fn refresh_consent(&self) -> NativeResult<()> {
        debug!("stub: consent refresh requested");
        Ok(())
    }
}

#[async_trait]
impl NativeDeepLinks for StubSdk {
    async fn handle_deep_link(&self, url: &str) -> NativeResult<DeepLinkOutcome> {
        self.ensure_initialized()?;
        Ok(resolve_url(url))
    }

    fn set_deep_link_listener(&self, listener: DeepLinkListener) -> NativeResult<()> {
        *lock(&self.listener) = Some(listener);
        Ok(())
    }
}

/// Resolve a link to itself, lifting `deep_link_subN` query parameters into
/// the positional sub-parameter slots. Query values are percent-decoded.
fn resolve_url(link: &str) -> DeepLinkOutcome {
    let mut params: BTreeMap<String, String> = match Url::parse(link) {
        Ok(url) => url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect(),
        Err(e) => {
            warn!(link, error = %e, "stub: unparseable deep link");
            BTreeMap::new()
        }
    };

    let mut subs: [Option<String>; 5] = Default::default();
    for (slot, key) in subs.iter_mut().zip(SUB_PARAM_KEYS) {
        *slot = params.remove(key);
    }

    DeepLinkOutcome {
        uri: Some(link.to_owned()),
        query_params: (!params.is_empty()).then_some(params),
        subs,
        status: DeepLinkStatus::Found,
        ..DeepLinkOutcome::not_found()
    }
}
