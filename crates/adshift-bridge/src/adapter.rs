// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native SDK adapter: the only code that calls into the native SDK.
//
// Every call is guarded. Errors reported by the SDK and panics unwinding out
// of native glue are both converted into a `BridgeError` tagged with the
// call family's code; nothing native crosses this boundary raw.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use adshift_core::error::{BridgeError, Result};
use adshift_core::{DeepLinkOutcome, DeepLinkPayload, Operation, Request};

use crate::traits::{DeepLinkListener, NativeError, NativeResult, NativeSdk};

/// Guarded, error-normalising wrapper around an injected native SDK handle.
pub struct SdkAdapter {
    sdk: Arc<dyn NativeSdk>,
}

impl SdkAdapter {
    pub fn new(sdk: Arc<dyn NativeSdk>) -> Self {
        debug!(platform = sdk.platform_name(), "native SDK adapter created");
        Self { sdk }
    }

    pub fn platform_name(&self) -> &str {
        self.sdk.platform_name()
    }

    /// Perform exactly one native call for `request`.
    pub async fn execute(&self, request: Request) -> Result<Value> {
        let op = request.operation();
        let sdk = &self.sdk;

        match request {
            Request::Initialize(options) => guard(op, || sdk.initialize(&options))?,
            Request::Start => guard_async(op, sdk.start()).await?,
            Request::Stop => guard(op, || sdk.stop())?,
            Request::IsStarted => return Ok(Value::Bool(self.is_started())),
            Request::SetDebugEnabled { enabled } => guard(op, || sdk.set_debug_enabled(enabled))?,
            Request::SetCustomerUserId { user_id } => {
                guard(op, || sdk.set_customer_user_id(&user_id))?
            }
            Request::SetAppOpenDebounce { debounce } => {
                guard(op, || sdk.set_app_open_debounce(debounce))?
            }
            Request::TrackEvent { event, values } => {
                guard_async(op, sdk.track_event(&event, values.as_ref())).await?
            }
            Request::TrackPurchase(purchase) => {
                guard_async(op, sdk.track_purchase(&purchase)).await?
            }
            Request::SetConsentData(consent) => guard(op, || sdk.set_consent_data(consent))?,
            Request::EnableTcfDataCollection { enabled } => {
                guard(op, || sdk.enable_tcf_data_collection(enabled))?
            }
            Request::RefreshConsent => guard(op, || sdk.refresh_consent())?,
            Request::HandleDeepLink { url } => {
                return self.handle_deep_link(&url).await.to_value();
            }
        }

        Ok(Value::Null)
    }

    /// Best-effort status check: any failure reads as "not started".
    pub fn is_started(&self) -> bool {
        guard(Operation::IsStarted, || self.sdk.is_started()).unwrap_or_else(|err| {
            debug!(error = %err, "isStarted check failed; reporting false");
            false
        })
    }

    /// Resolve `url`. Never fails: a native failure becomes an outcome with
    /// status `error` carrying the failure message.
    pub async fn handle_deep_link(&self, url: &str) -> DeepLinkPayload {
        let outcome = guard_async(Operation::HandleDeepLink, self.sdk.handle_deep_link(url))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "deep-link resolution failed");
                DeepLinkOutcome::failed(err.to_string())
            });
        outcome.to_payload()
    }

    /// Install the native deep-link listener.
    pub fn register_deep_link_listener(&self, listener: DeepLinkListener) -> Result<()> {
        guard(Operation::HandleDeepLink, || {
            self.sdk.set_deep_link_listener(listener)
        })
    }
}

fn guard<T>(op: Operation, call: impl FnOnce() -> NativeResult<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result.map_err(|err| normalize(op, err)),
        Err(panic) => Err(from_panic(op, panic)),
    }
}

async fn guard_async<T>(op: Operation, call: impl Future<Output = NativeResult<T>>) -> Result<T> {
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result.map_err(|err| normalize(op, err)),
        Err(panic) => Err(from_panic(op, panic)),
    }
}

/// Map a native error into the bridge taxonomy for `op`'s call family.
fn normalize(op: Operation, err: NativeError) -> BridgeError {
    warn!(operation = %op, error = %err, "native call failed");
    match err {
        NativeError::NoContext => BridgeError::NoContext,
        NativeError::NotInitialized => BridgeError::Native {
            code: op.error_code(),
            message: err.to_string(),
            detail: None,
        },
        NativeError::Raised { message, code } => BridgeError::Native {
            code: op.error_code(),
            message,
            detail: code.map(|c| c.to_string()),
        },
    }
}

fn from_panic(op: Operation, panic: Box<dyn Any + Send>) -> BridgeError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "native SDK panicked".to_owned());
    warn!(operation = %op, %message, "native call panicked");
    BridgeError::Native {
        code: op.error_code(),
        message,
        detail: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSdk;
    use adshift_core::{DeepLinkStatus, ErrorCode, EventKind, Purchase};
    use serde_json::json;

    fn adapter() -> (Arc<FakeSdk>, SdkAdapter) {
        let sdk = Arc::new(FakeSdk::default());
        let adapter = SdkAdapter::new(sdk.clone());
        (sdk, adapter)
    }

    #[tokio::test]
    async fn native_code_is_carried_as_detail() {
        let (sdk, adapter) = adapter();
        sdk.fail("start", NativeError::with_code(-1009, "The network is offline"));

        match adapter.execute(Request::Start).await {
            Err(BridgeError::Native {
                code,
                message,
                detail,
            }) => {
                assert_eq!(code, ErrorCode::Start);
                assert_eq!(message, "The network is offline");
                assert_eq!(detail.as_deref(), Some("-1009"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_context_keeps_its_own_code() {
        let (sdk, adapter) = adapter();
        sdk.fail("initialize", NativeError::NoContext);
        let err = adapter
            .execute(Request::Initialize(Default::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NoContext));
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let (sdk, adapter) = adapter();
        sdk.panic_on("trackEvent");
        let err = adapter
            .execute(Request::TrackEvent {
                event: EventKind::Login,
                values: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Track));
        assert_eq!(err.to_string(), "native trackEvent exploded");

        sdk.panic_on("stop");
        let err = adapter.execute(Request::Stop).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Stop));
    }

    #[tokio::test]
    async fn is_started_swallows_failures() {
        let (sdk, adapter) = adapter();
        sdk.set_started(true);
        assert_eq!(adapter.execute(Request::IsStarted).await.unwrap(), json!(true));

        sdk.fail("isStarted", NativeError::raised("boom"));
        assert!(!adapter.is_started());
        assert_eq!(adapter.execute(Request::IsStarted).await.unwrap(), json!(false));

        sdk.panic_on("isStarted");
        assert!(!adapter.is_started());
    }

    #[tokio::test]
    async fn deep_link_failure_becomes_error_outcome() {
        let (sdk, adapter) = adapter();
        sdk.fail("handleDeepLink", NativeError::raised("invalid link"));
        let payload = adapter.handle_deep_link("myapp://x").await;
        assert_eq!(payload.status, DeepLinkStatus::Error);
        assert_eq!(payload.error_message.as_deref(), Some("invalid link"));
        assert!(payload.deep_link.is_none());
    }

    #[tokio::test]
    async fn each_request_makes_one_native_call() {
        let (sdk, adapter) = adapter();
        let purchase = Purchase {
            product_id: "sku1".into(),
            revenue: 9.99,
            currency: "USD".into(),
            transaction_id: "tx1".into(),
        };
        adapter
            .execute(Request::TrackPurchase(purchase.clone()))
            .await
            .expect("purchase");
        adapter.execute(Request::RefreshConsent).await.expect("refresh");

        assert_eq!(sdk.calls(), vec!["trackPurchase", "refreshConsent"]);
        assert_eq!(sdk.purchases(), vec![purchase]);
    }
}
