// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android adapter: translates the canonical capability traits to the
// vocabulary of the AdShift Android SDK (`com.adshift.sdk.core.AdShiftLib`).
//
// ## Architecture notes
//
// The SDK handle is injected as an `AdShiftLib` implementation; the JNI glue
// that backs it lives with the host application. Everything here is
// translation and completion plumbing:
//
// - Async SDK calls report through `RequestListener` objects invoked from SDK
//   worker threads. Each listener is bridged to a oneshot future; a second
//   invocation is ignored and a listener released without a callback
//   completes with an error.
// - The SDK has one deep-link listener slot. The adapter installs its own
//   router there once and multiplexes: direct `handle_deep_link` calls wait
//   for the next non-deferred result, everything else goes to the stream
//   listener. Installing a per-call listener (as the SDK's docs suggest)
//   would silently detach the event stream.
// - The SDK wants the application `Context` at init; the host attaches and
//   detaches it with the engine lifecycle.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use adshift_core::{
    Consent, DeepLinkErrorKind, DeepLinkOutcome, DeepLinkStatus, EventKind, InitOptions, Purchase,
};

use crate::lock;
use crate::traits::*;

// ---------------------------------------------------------------------------
// Native vocabulary
// ---------------------------------------------------------------------------

/// A `java.lang.Exception` thrown by an SDK method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaException {
    /// `Throwable.getMessage()`, which may be null.
    pub message: Option<String>,
}

impl JavaException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl std::fmt::Display for JavaException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("Unknown error"))
    }
}

impl std::error::Error for JavaException {}

impl From<JavaException> for NativeError {
    fn from(err: JavaException) -> Self {
        NativeError::raised(err.to_string())
    }
}

pub type JavaResult<T> = std::result::Result<T, JavaException>;

/// `AdShiftRequestListener`: completion callback for async SDK requests.
pub trait RequestListener: Send + Sync {
    fn on_success(&self);

    fn on_error(&self, code: i32, error: String);
}

/// `DeepLinkStatus` as the Android SDK spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Found,
    NotFound,
    Error,
}

/// `DeepLinkError` reasons reported by the Android SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepLinkError {
    DeepLinkNotFound,
    InvalidUrl,
    NetworkError,
    Timeout,
    ServerError,
    Unknown,
}

impl DeepLinkError {
    /// Kotlin `Enum.name`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeepLinkNotFound => "DEEP_LINK_NOT_FOUND",
            Self::InvalidUrl => "INVALID_URL",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ServerError => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn into_kind(self) -> DeepLinkErrorKind {
        match self {
            Self::DeepLinkNotFound => DeepLinkErrorKind::DeepLinkNotFound,
            Self::InvalidUrl => DeepLinkErrorKind::InvalidUrl,
            Self::NetworkError => DeepLinkErrorKind::NetworkError,
            Self::Timeout => DeepLinkErrorKind::Timeout,
            other => DeepLinkErrorKind::Other(other.name().to_owned()),
        }
    }
}

/// `DeepLinkResult` delivered to the SDK's deep-link listener.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepLinkResult {
    pub uri: Option<String>,
    pub query_params: Option<HashMap<String, String>>,
    pub sub1: Option<String>,
    pub sub2: Option<String>,
    pub sub3: Option<String>,
    pub sub4: Option<String>,
    pub sub5: Option<String>,
    pub is_deferred: bool,
    pub status: LinkStatus,
    pub error: Option<DeepLinkError>,
}

impl DeepLinkResult {
    fn into_outcome(self) -> DeepLinkOutcome {
        DeepLinkOutcome {
            uri: self.uri,
            link_value: None,
            query_params: self.query_params.map(|p| p.into_iter().collect()),
            subs: [self.sub1, self.sub2, self.sub3, self.sub4, self.sub5],
            is_deferred: self.is_deferred,
            status: match self.status {
                LinkStatus::Found => DeepLinkStatus::Found,
                LinkStatus::NotFound => DeepLinkStatus::NotFound,
                LinkStatus::Error => DeepLinkStatus::Error,
            },
            error: self.error.map(DeepLinkError::into_kind),
        }
    }
}

/// `AdShiftConsent` as built by `forGDPRUser` / `forNonGDPRUser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdShiftConsent {
    pub is_user_subject_to_gdpr: bool,
    pub has_consent_for_data_usage: bool,
    pub has_consent_for_ads_personalization: bool,
    pub has_consent_for_ad_storage: bool,
}

impl AdShiftConsent {
    pub fn for_gdpr_user(data_usage: bool, ads_personalization: bool, ad_storage: bool) -> Self {
        Self {
            is_user_subject_to_gdpr: true,
            has_consent_for_data_usage: data_usage,
            has_consent_for_ads_personalization: ads_personalization,
            has_consent_for_ad_storage: ad_storage,
        }
    }

    pub fn for_non_gdpr_user() -> Self {
        Self {
            is_user_subject_to_gdpr: false,
            has_consent_for_data_usage: false,
            has_consent_for_ads_personalization: false,
            has_consent_for_ad_storage: false,
        }
    }
}

impl From<Consent> for AdShiftConsent {
    fn from(consent: Consent) -> Self {
        match consent {
            Consent::GdprSubject {
                data_usage,
                personalization,
                ad_storage,
            } => Self::for_gdpr_user(data_usage, personalization, ad_storage),
            Consent::NonGdprSubject => Self::for_non_gdpr_user(),
        }
    }
}

/// `DeepLinkListener.onDeepLinking`.
pub type NativeDeepLinkListener = Arc<dyn Fn(DeepLinkResult) + Send + Sync>;

/// The `AdShiftLib` singleton, as exposed to Rust by the host's JNI glue.
pub trait AdShiftLib: Send + Sync + 'static {
    /// `android.content.Context` handle.
    type Context: Clone + Send + Sync;

    fn init_sdk(&self, context: &Self::Context, api_key: &str) -> JavaResult<()>;

    fn set_debug_log(&self, enabled: bool) -> JavaResult<()>;

    fn set_app_open_debounce_ms(&self, ms: i64) -> JavaResult<()>;

    fn set_collect_oaid(&self, collect: bool) -> JavaResult<()>;

    fn start(&self, listener: Box<dyn RequestListener>) -> JavaResult<()>;

    fn stop(&self) -> JavaResult<()>;

    fn is_started(&self) -> JavaResult<bool>;

    fn set_customer_user_id(&self, user_id: &str) -> JavaResult<()>;

    fn track_event(
        &self,
        event_name: &str,
        event_value: &Map<String, Value>,
        listener: Box<dyn RequestListener>,
    ) -> JavaResult<()>;

    fn track_purchase(
        &self,
        product_id: &str,
        price: f64,
        currency: &str,
        token: &str,
        listener: Box<dyn RequestListener>,
    ) -> JavaResult<()>;

    fn set_consent_data(&self, consent: AdShiftConsent) -> JavaResult<()>;

    fn enable_tcf_data_collection(&self, enabled: bool) -> JavaResult<()>;

    fn refresh_consent(&self) -> JavaResult<()>;

    /// Replace the SDK's single deep-link listener.
    fn set_deep_link_listener(&self, listener: NativeDeepLinkListener) -> JavaResult<()>;

    /// Feed an `ACTION_VIEW` intent for `uri` to the SDK's app-link handling.
    fn handle_app_link_intent(&self, uri: &str) -> JavaResult<()>;
}

// ---------------------------------------------------------------------------
// Completion plumbing
// ---------------------------------------------------------------------------

/// `RequestListener` that completes a oneshot exactly once.
struct RequestCompletion {
    tx: Mutex<Option<oneshot::Sender<NativeResult<()>>>>,
}

impl RequestCompletion {
    fn pair() -> (Box<dyn RequestListener>, oneshot::Receiver<NativeResult<()>>) {
        let (tx, rx) = oneshot::channel();
        let listener = Self {
            tx: Mutex::new(Some(tx)),
        };
        (Box::new(listener), rx)
    }

    fn complete(&self, result: NativeResult<()>) {
        match lock(&self.tx).take() {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => warn!("request listener invoked more than once; ignoring"),
        }
    }
}

impl RequestListener for RequestCompletion {
    fn on_success(&self) {
        self.complete(Ok(()));
    }

    fn on_error(&self, code: i32, error: String) {
        self.complete(Err(NativeError::with_code(code, error)));
    }
}

async fn completed(rx: oneshot::Receiver<NativeResult<()>>) -> NativeResult<()> {
    rx.await.unwrap_or_else(|_| {
        Err(NativeError::raised(
            "request listener released without a result",
        ))
    })
}

/// Owner of the SDK's single deep-link listener slot.
#[derive(Default)]
struct LinkRouter {
    installed: Mutex<bool>,
    next_waiter: AtomicU64,
    waiters: Mutex<VecDeque<(u64, oneshot::Sender<DeepLinkOutcome>)>>,
    stream: Mutex<Option<DeepLinkListener>>,
}

impl LinkRouter {
    fn route(&self, outcome: DeepLinkOutcome) {
        let outcome = if outcome.is_deferred {
            outcome
        } else {
            match self.hand_to_waiter(outcome) {
                Some(unclaimed) => unclaimed,
                None => return,
            }
        };

        let stream = lock(&self.stream).clone();
        match stream {
            Some(listener) => listener(outcome),
            None => debug!("no stream listener; dropping deep link"),
        }
    }

    /// Give `outcome` to the oldest live waiter. Returns it if nobody took it.
    fn hand_to_waiter(&self, mut outcome: DeepLinkOutcome) -> Option<DeepLinkOutcome> {
        let mut waiters = lock(&self.waiters);
        while let Some((_, tx)) = waiters.pop_front() {
            match tx.send(outcome) {
                Ok(()) => return None,
                Err(returned) => outcome = returned,
            }
        }
        Some(outcome)
    }

    fn add_waiter(&self) -> (u64, oneshot::Receiver<DeepLinkOutcome>) {
        let id = self.next_waiter.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).push_back((id, tx));
        (id, rx)
    }

    fn remove_waiter(&self, id: u64) {
        lock(&self.waiters).retain(|(waiter, _)| *waiter != id);
    }
}

/// Dequeues a direct-call waiter when its future goes away, answered or not.
struct WaiterGuard<'a> {
    links: &'a LinkRouter,
    id: u64,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.links.remove_waiter(self.id);
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Android implementation of the native capability traits.
pub struct AndroidSdk<L: AdShiftLib> {
    lib: L,
    context: RwLock<Option<L::Context>>,
    links: Arc<LinkRouter>,
}

impl<L: AdShiftLib> AndroidSdk<L> {
    pub fn new(lib: L) -> Self {
        Self {
            lib,
            context: RwLock::new(None),
            links: Arc::new(LinkRouter::default()),
        }
    }

    /// Engine attached: the application context becomes available.
    pub fn attach_context(&self, context: L::Context) {
        *self.context.write().unwrap_or_else(PoisonError::into_inner) = Some(context);
    }

    /// Engine detached: later `initialize` calls fail with `NoContext`.
    pub fn detach_context(&self) {
        *self.context.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn lib(&self) -> &L {
        &self.lib
    }

    /// Install the router into the SDK's listener slot, once.
    fn ensure_native_listener(&self) -> NativeResult<()> {
        let mut installed = lock(&self.links.installed);
        if *installed {
            return Ok(());
        }

        let router = Arc::downgrade(&self.links);
        let listener: NativeDeepLinkListener = Arc::new(move |result: DeepLinkResult| {
            if let Some(router) = router.upgrade() {
                router.route(result.into_outcome());
            }
        });
        self.lib.set_deep_link_listener(listener)?;
        *installed = true;
        debug!("deep-link router installed in AdShiftLib");
        Ok(())
    }
}

impl<L: AdShiftLib> NativeSdk for AndroidSdk<L> {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

#[async_trait]
impl<L: AdShiftLib> NativeLifecycle for AndroidSdk<L> {
    fn initialize(&self, options: &InitOptions) -> NativeResult<()> {
        let context = self
            .context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(NativeError::NoContext)?;

        self.lib.init_sdk(&context, &options.api_key)?;
        if let Some(enabled) = options.is_debug {
            self.lib.set_debug_log(enabled)?;
        }
        if let Some(debounce) = options.app_open_debounce {
            self.lib.set_app_open_debounce_ms(millis(debounce))?;
        }
        if let Some(collect) = options.collect_oaid {
            self.lib.set_collect_oaid(collect)?;
        }
        if options.disable_skan.is_some()
            || options.wait_for_att_before_start.is_some()
            || options.att_timeout.is_some()
        {
            debug!("ignoring iOS-only initialize options");
        }

        info!("AdShift Android SDK initialised");
        Ok(())
    }

    async fn start(&self) -> NativeResult<()> {
        let (listener, done) = RequestCompletion::pair();
        self.lib.start(listener)?;
        completed(done).await
    }

    fn stop(&self) -> NativeResult<()> {
        Ok(self.lib.stop()?)
    }

    fn is_started(&self) -> NativeResult<bool> {
        Ok(self.lib.is_started()?)
    }
}

impl<L: AdShiftLib> NativeConfig for AndroidSdk<L> {
    fn set_debug_enabled(&self, enabled: bool) -> NativeResult<()> {
        Ok(self.lib.set_debug_log(enabled)?)
    }

    fn set_customer_user_id(&self, user_id: &str) -> NativeResult<()> {
        Ok(self.lib.set_customer_user_id(user_id)?)
    }

    fn set_app_open_debounce(&self, debounce: Duration) -> NativeResult<()> {
        Ok(self.lib.set_app_open_debounce_ms(millis(debounce))?)
    }

    fn enable_tcf_data_collection(&self, enabled: bool) -> NativeResult<()> {
        Ok(self.lib.enable_tcf_data_collection(enabled)?)
    }
}

#[async_trait]
impl<L: AdShiftLib> NativeTracking for AndroidSdk<L> {
    async fn track_event(
        &self,
        event: &EventKind,
        values: Option<&Map<String, Value>>,
    ) -> NativeResult<()> {
        // The Android SDK takes a map either way; absent values travel empty.
        let empty = Map::new();
        let (listener, done) = RequestCompletion::pair();
        self.lib
            .track_event(event.token(), values.unwrap_or(&empty), listener)?;
        completed(done).await
    }

    async fn track_purchase(&self, purchase: &Purchase) -> NativeResult<()> {
        let (listener, done) = RequestCompletion::pair();
        self.lib.track_purchase(
            &purchase.product_id,
            purchase.revenue,
            &purchase.currency,
            &purchase.transaction_id,
            listener,
        )?;
        completed(done).await
    }
}

impl<L: AdShiftLib> NativeConsent for AndroidSdk<L> {
    fn set_consent_data(&self, consent: Consent) -> NativeResult<()> {
        Ok(self.lib.set_consent_data(consent.into())?)
    }

    fn refresh_consent(&self) -> NativeResult<()> {
        Ok(self.lib.refresh_consent()?)
    }
}

#[async_trait]
impl<L: AdShiftLib> NativeDeepLinks for AndroidSdk<L> {
    async fn handle_deep_link(&self, url: &str) -> NativeResult<DeepLinkOutcome> {
        self.ensure_native_listener()?;
        let (id, rx) = self.links.add_waiter();
        let _waiter = WaiterGuard {
            links: &self.links,
            id,
        };
        self.lib.handle_app_link_intent(url)?;
        rx.await.map_err(|_| {
            NativeError::raised("deep-link listener released without a result")
        })
    }

    fn set_deep_link_listener(&self, listener: DeepLinkListener) -> NativeResult<()> {
        *lock(&self.links.stream) = Some(listener);
        self.ensure_native_listener()
    }
}
