// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS adapter: translates the canonical capability traits to the vocabulary
// of the AdShift iOS SDK (`Adshift.shared`).
//
// The iOS SDK configures through properties, reports `start` and tracking
// through completion handlers, resolves deep links with an async call and
// tracks events as the typed `ASInAppEventType`. The handle is injected as an
// `AdshiftSdk` implementation supplied by the host's Swift glue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{debug, info};

use adshift_core::{
    Consent, DeepLinkErrorKind, DeepLinkOutcome, DeepLinkStatus, EventKind, InitOptions, Purchase,
};

use crate::traits::*;

// ---------------------------------------------------------------------------
// Native vocabulary
// ---------------------------------------------------------------------------

/// `Error` handed to a completion handler or thrown by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkError {
    pub localized_description: String,
    /// `NSError.code`, when the SDK reports one.
    pub code: Option<i32>,
}

impl From<SdkError> for NativeError {
    fn from(err: SdkError) -> Self {
        match err.code {
            Some(code) => NativeError::with_code(code, err.localized_description),
            None => NativeError::raised(err.localized_description),
        }
    }
}

/// Completion handler taken by `start`, `track` and `trackPurchase`.
pub type Completion = Box<dyn FnOnce(Result<(), SdkError>) + Send>;

/// `ASInAppEventType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InAppEventType {
    Purchase,
    Login,
    AddToCart,
    AddToWishList,
    AddPaymentInfo,
    InitiatedCheckout,
    CompleteRegistration,
    TutorialCompletion,
    LevelAchieved,
    AchievementUnlocked,
    ContentView,
    ListView,
    Search,
    Rate,
    Share,
    Invite,
    ReEngage,
    Update,
    OpenedFromPushNotification,
    Subscribe,
    StartTrial,
    AdClick,
    AdView,
    SpentCredit,
    TravelBooking,
    LocationChanged,
    LocationCoordinates,
    OrderId,
    CustomerSegment,
    CustomEvent(String),
}

impl From<&EventKind> for InAppEventType {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Purchase => Self::Purchase,
            EventKind::Login => Self::Login,
            EventKind::AddToCart => Self::AddToCart,
            EventKind::AddToWishList => Self::AddToWishList,
            EventKind::AddPaymentInfo => Self::AddPaymentInfo,
            EventKind::InitiatedCheckout => Self::InitiatedCheckout,
            EventKind::CompleteRegistration => Self::CompleteRegistration,
            EventKind::TutorialCompletion => Self::TutorialCompletion,
            EventKind::LevelAchieved => Self::LevelAchieved,
            EventKind::AchievementUnlocked => Self::AchievementUnlocked,
            EventKind::ContentView => Self::ContentView,
            EventKind::ListView => Self::ListView,
            EventKind::Search => Self::Search,
            EventKind::Rate => Self::Rate,
            EventKind::Share => Self::Share,
            EventKind::Invite => Self::Invite,
            EventKind::ReEngage => Self::ReEngage,
            EventKind::Update => Self::Update,
            EventKind::OpenedFromPushNotification => Self::OpenedFromPushNotification,
            EventKind::Subscribe => Self::Subscribe,
            EventKind::StartTrial => Self::StartTrial,
            EventKind::AdClick => Self::AdClick,
            EventKind::AdView => Self::AdView,
            EventKind::SpentCredits => Self::SpentCredit,
            EventKind::TravelBooking => Self::TravelBooking,
            EventKind::LocationChanged => Self::LocationChanged,
            EventKind::LocationCoordinates => Self::LocationCoordinates,
            EventKind::OrderId => Self::OrderId,
            EventKind::CustomerSegment => Self::CustomerSegment,
            EventKind::Custom(name) => Self::CustomEvent(name.clone()),
        }
    }
}

/// `AdShiftConsent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdshiftConsent {
    GdprUser {
        has_consent_for_data_usage: bool,
        has_consent_for_ads_personalization: bool,
        has_consent_for_ad_storage: bool,
    },
    NonGdprUser,
}

impl From<Consent> for AdshiftConsent {
    fn from(consent: Consent) -> Self {
        match consent {
            Consent::GdprSubject {
                data_usage,
                personalization,
                ad_storage,
            } => Self::GdprUser {
                has_consent_for_data_usage: data_usage,
                has_consent_for_ads_personalization: personalization,
                has_consent_for_ad_storage: ad_storage,
            },
            Consent::NonGdprSubject => Self::NonGdprUser,
        }
    }
}

/// `DeeplinkError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeeplinkError {
    DecodingError,
    InvalidUrl,
    DeepLinkNotFound,
    SystemError(String),
}

impl From<DeeplinkError> for DeepLinkErrorKind {
    fn from(err: DeeplinkError) -> Self {
        match err {
            DeeplinkError::DecodingError => Self::DecodingError,
            DeeplinkError::InvalidUrl => Self::InvalidUrl,
            DeeplinkError::DeepLinkNotFound => Self::DeepLinkNotFound,
            DeeplinkError::SystemError(message) => Self::System(message),
        }
    }
}

/// `DeeplinkResponse`. Field names follow the SDK's JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeeplinkResponse {
    pub deeplink: Option<String>,
    pub deep_link_value: Option<String>,
    pub params: Option<HashMap<String, String>>,
    pub deep_link_sub1: Option<String>,
    pub deep_link_sub2: Option<String>,
    pub deep_link_sub3: Option<String>,
    pub deep_link_sub4: Option<String>,
    pub deep_link_sub5: Option<String>,
    pub is_deferred: Option<bool>,
    /// Raw value of the status enum (`found`, `notFound`, `error`).
    pub status: Option<String>,
    pub error: Option<DeeplinkError>,
}

impl From<DeeplinkResponse> for DeepLinkOutcome {
    fn from(response: DeeplinkResponse) -> Self {
        DeepLinkOutcome {
            uri: response.deeplink,
            link_value: response.deep_link_value,
            query_params: response.params.map(|p| p.into_iter().collect()),
            subs: [
                response.deep_link_sub1,
                response.deep_link_sub2,
                response.deep_link_sub3,
                response.deep_link_sub4,
                response.deep_link_sub5,
            ],
            is_deferred: response.is_deferred.unwrap_or(false),
            status: response
                .status
                .as_deref()
                .and_then(DeepLinkStatus::parse)
                .unwrap_or(DeepLinkStatus::NotFound),
            error: response.error.map(Into::into),
        }
    }
}

/// `onDeepLinkReceived` handler.
pub type DeeplinkHandler = Arc<dyn Fn(DeeplinkResponse) + Send + Sync>;

/// The `Adshift.shared` singleton as exposed by the host's Swift glue.
#[async_trait]
pub trait AdshiftSdk: Send + Sync + 'static {
    fn set_api_key(&self, api_key: &str);

    fn set_is_debug(&self, enabled: bool);

    fn set_app_open_debounce_ms(&self, ms: i64);

    fn set_disable_skan(&self, disabled: bool);

    fn set_wait_for_att_before_start(&self, wait: bool);

    fn set_att_timeout_ms(&self, ms: i64);

    fn start(&self, completion: Completion);

    fn stop(&self);

    fn is_started(&self) -> bool;

    fn set_customer_user_id(&self, user_id: &str);

    async fn track(
        &self,
        event: InAppEventType,
        values: Option<&Map<String, Value>>,
        completion: Completion,
    );

    async fn track_purchase(
        &self,
        product_id: &str,
        price: f64,
        currency: &str,
        token: &str,
        completion: Completion,
    );

    fn set_consent_data(&self, consent: AdshiftConsent);

    fn enable_tcf_data_collection(&self, enabled: bool);

    /// Returns whether a refresh was scheduled; the result is advisory.
    fn refresh_consent(&self) -> bool;

    async fn handle_deep_link(&self, url: &str) -> Result<DeeplinkResponse, SdkError>;

    fn on_deep_link_received(&self, handler: DeeplinkHandler);
}

fn completion() -> (Completion, oneshot::Receiver<Result<(), SdkError>>) {
    let (tx, rx) = oneshot::channel();
    let completion: Completion = Box::new(move |result| {
        let _ = tx.send(result);
    });
    (completion, rx)
}

async fn completed(rx: oneshot::Receiver<Result<(), SdkError>>) -> NativeResult<()> {
    match rx.await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(NativeError::raised(
            "completion handler released without being called",
        )),
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// iOS implementation of the native capability traits.
pub struct IosSdk<S: AdshiftSdk> {
    sdk: S,
}

impl<S: AdshiftSdk> IosSdk<S> {
    pub fn new(sdk: S) -> Self {
        Self { sdk }
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

impl<S: AdshiftSdk> NativeSdk for IosSdk<S> {
    fn platform_name(&self) -> &str {
        "iOS"
    }
}

#[async_trait]
impl<S: AdshiftSdk> NativeLifecycle for IosSdk<S> {
    fn initialize(&self, options: &InitOptions) -> NativeResult<()> {
        self.sdk.set_api_key(&options.api_key);
        if let Some(enabled) = options.is_debug {
            self.sdk.set_is_debug(enabled);
        }
        if let Some(debounce) = options.app_open_debounce {
            self.sdk.set_app_open_debounce_ms(millis(debounce));
        }
        if let Some(disabled) = options.disable_skan {
            self.sdk.set_disable_skan(disabled);
        }
        if let Some(wait) = options.wait_for_att_before_start {
            self.sdk.set_wait_for_att_before_start(wait);
        }
        if let Some(timeout) = options.att_timeout {
            self.sdk.set_att_timeout_ms(millis(timeout));
        }
        if options.collect_oaid.is_some() {
            debug!("ignoring Android-only initialize options");
        }

        info!("AdShift iOS SDK configured");
        Ok(())
    }

    async fn start(&self) -> NativeResult<()> {
        let (done, rx) = completion();
        self.sdk.start(done);
        completed(rx).await
    }

    fn stop(&self) -> NativeResult<()> {
        self.sdk.stop();
        Ok(())
    }

    fn is_started(&self) -> NativeResult<bool> {
        Ok(self.sdk.is_started())
    }
}

impl<S: AdshiftSdk> NativeConfig for IosSdk<S> {
    fn set_debug_enabled(&self, enabled: bool) -> NativeResult<()> {
        self.sdk.set_is_debug(enabled);
        Ok(())
    }

    fn set_customer_user_id(&self, user_id: &str) -> NativeResult<()> {
        self.sdk.set_customer_user_id(user_id);
        Ok(())
    }

    fn set_app_open_debounce(&self, debounce: Duration) -> NativeResult<()> {
        self.sdk.set_app_open_debounce_ms(millis(debounce));
        Ok(())
    }

    fn enable_tcf_data_collection(&self, enabled: bool) -> NativeResult<()> {
        self.sdk.enable_tcf_data_collection(enabled);
        Ok(())
    }
}

#[async_trait]
impl<S: AdshiftSdk> NativeTracking for IosSdk<S> {
    async fn track_event(
        &self,
        event: &EventKind,
        values: Option<&Map<String, Value>>,
    ) -> NativeResult<()> {
        let (done, rx) = completion();
        self.sdk.track(event.into(), values, done).await;
        completed(rx).await
    }

    async fn track_purchase(&self, purchase: &Purchase) -> NativeResult<()> {
        let (done, rx) = completion();
        self.sdk
            .track_purchase(
                &purchase.product_id,
                purchase.revenue,
                &purchase.currency,
                &purchase.transaction_id,
                done,
            )
            .await;
        completed(rx).await
    }
}

impl<S: AdshiftSdk> NativeConsent for IosSdk<S> {
    fn set_consent_data(&self, consent: Consent) -> NativeResult<()> {
        self.sdk.set_consent_data(consent.into());
        Ok(())
    }

    fn refresh_consent(&self) -> NativeResult<()> {
        let scheduled = self.sdk.refresh_consent();
        debug!(scheduled, "consent refresh requested");
        Ok(())
    }
}

#[async_trait]
impl<S: AdshiftSdk> NativeDeepLinks for IosSdk<S> {
    async fn handle_deep_link(&self, url: &str) -> NativeResult<DeepLinkOutcome> {
        let response = self.sdk.handle_deep_link(url).await?;
        Ok(response.into())
    }

    fn set_deep_link_listener(&self, listener: DeepLinkListener) -> NativeResult<()> {
        self.sdk
            .on_deep_link_received(Arc::new(move |response: DeeplinkResponse| {
                listener(response.into())
            }));
        Ok(())
    }
}
