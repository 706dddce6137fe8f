// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin facade wiring the method channel and the deep-link event channel
// to one native SDK handle.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{Instrument, debug_span, info};

use adshift_core::BridgeConfig;

use crate::adapter::SdkAdapter;
use crate::channel::{EventSink, MethodCall, MethodResponse, PendingCall};
use crate::delivery::DeliveryContext;
use crate::dispatcher::Dispatcher;
use crate::stream::DeepLinkStream;
use crate::traits::NativeSdk;

/// Entry point the host registers on its two channels.
pub struct AdshiftPlugin {
    config: BridgeConfig,
    dispatcher: Arc<Dispatcher>,
    stream: DeepLinkStream,
    ctx: DeliveryContext,
    runtime: Handle,
}

impl AdshiftPlugin {
    /// Build the bridge around `sdk`.
    ///
    /// Native work runs on `runtime`; responses and events are delivered
    /// through `ctx`, whose loop the host drives on its main context.
    pub fn new(
        sdk: Arc<dyn NativeSdk>,
        config: BridgeConfig,
        ctx: DeliveryContext,
        runtime: Handle,
    ) -> Self {
        let adapter = Arc::new(SdkAdapter::new(sdk));
        info!(
            platform = adapter.platform_name(),
            method_channel = %config.method_channel,
            event_channel = %config.event_channel,
            "AdShift plugin registered"
        );
        Self {
            dispatcher: Arc::new(Dispatcher::new(Arc::clone(&adapter))),
            stream: DeepLinkStream::new(adapter, ctx.clone()),
            config,
            ctx,
            runtime,
        }
    }

    pub fn method_channel(&self) -> &str {
        &self.config.method_channel
    }

    pub fn event_channel(&self) -> &str {
        &self.config.event_channel
    }

    pub fn delivery_context(&self) -> &DeliveryContext {
        &self.ctx
    }

    /// Handle one method-channel call. Returns immediately; `reply` is
    /// resolved exactly once, on the delivery context.
    pub fn handle_method_call(&self, call: MethodCall, reply: PendingCall) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let span = debug_span!("method_call", call_id = %reply.id(), method = reply.method());
        self.runtime.spawn(
            async move {
                let result = dispatcher.dispatch(&call.method, &call.arguments).await;
                reply.resolve(MethodResponse::from_result(result));
            }
            .instrument(span),
        );
    }

    /// Convenience wrapper around [`Self::handle_method_call`] with a fresh
    /// pending call.
    pub fn call(&self, call: MethodCall) -> tokio::sync::oneshot::Receiver<MethodResponse> {
        let (reply, rx) = PendingCall::channel(call.method.clone(), self.ctx.clone());
        self.handle_method_call(call, reply);
        rx
    }

    /// Event channel: a subscriber started listening.
    pub fn on_listen(&self, sink: Arc<dyn EventSink>) {
        self.stream.on_listen(sink);
    }

    /// Event channel: the subscriber cancelled.
    pub fn on_cancel(&self) {
        self.stream.on_cancel();
    }

    pub fn deep_link_stream(&self) -> &DeepLinkStream {
        &self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSdk;
    use crate::traits::NativeError;
    use adshift_core::{DeepLinkOutcome, DeepLinkStatus};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    fn plugin() -> (Arc<FakeSdk>, AdshiftPlugin) {
        let sdk = Arc::new(FakeSdk::default());
        let (ctx, delivery) = DeliveryContext::new();
        tokio::spawn(delivery.run());
        let plugin = AdshiftPlugin::new(sdk.clone(), BridgeConfig::default(), ctx, Handle::current());
        (sdk, plugin)
    }

    #[tokio::test]
    async fn channel_names_come_from_config() {
        let (_, plugin) = plugin();
        assert_eq!(plugin.method_channel(), "com.adshift/sdk");
        assert_eq!(plugin.event_channel(), "com.adshift/sdk/deeplinks");
    }

    #[tokio::test]
    async fn responses_arrive_on_delivery_context() {
        let (_, plugin) = plugin();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let reply = PendingCall::new("start", plugin.delivery_context().clone(), move |response| {
            let _ = tx.send((response, DeliveryContext::is_current()));
        });
        plugin.handle_method_call(MethodCall::new("start", Value::Null), reply);

        let (response, on_context) = rx.await.expect("response");
        assert_eq!(response, MethodResponse::Success { result: Value::Null });
        assert!(on_context);
    }

    #[tokio::test]
    async fn every_call_resolves_exactly_once() {
        let (sdk, plugin) = plugin();
        sdk.fail("trackEvent", NativeError::with_code(500, "server error"));

        let calls = [
            MethodCall::new("initialize", json!({ "apiKey": "k" })),
            MethodCall::new("trackEvent", json!({ "eventName": "as_login" })),
            MethodCall::new("trackPurchase", json!({ "productId": "sku1" })),
            MethodCall::new("isStarted", Value::Null),
            MethodCall::new("noSuchMethod", Value::Null),
        ];

        let counts = Arc::new(Mutex::new(Vec::new()));
        let mut receivers = Vec::new();
        for call in calls {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let counts = Arc::clone(&counts);
            let method = call.method.clone();
            let reply = PendingCall::new(method.clone(), plugin.delivery_context().clone(), move |response| {
                counts.lock().unwrap().push(method);
                let _ = tx.send(response);
            });
            plugin.handle_method_call(call, reply);
            receivers.push(rx);
        }

        let mut responses = Vec::new();
        for rx in receivers {
            responses.push(rx.await.expect("response"));
        }

        assert_eq!(counts.lock().unwrap().len(), 5);
        assert_eq!(responses[0], MethodResponse::Success { result: Value::Null });
        match &responses[1] {
            MethodResponse::Error(payload) => {
                assert_eq!(payload.code, "TRACK_ERROR");
                assert_eq!(payload.detail.as_deref(), Some("500"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&responses[2], MethodResponse::Error(p) if p.code == "INVALID_ARGS"));
        assert_eq!(responses[3], MethodResponse::Success { result: json!(false) });
        assert_eq!(responses[4], MethodResponse::NotImplemented);
    }

    #[tokio::test]
    async fn direct_deep_link_is_independent_of_stream() {
        let (sdk, plugin) = plugin();
        let events = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&events);
        plugin.on_listen(Arc::new(move |event: Value| store.lock().unwrap().push(event)));

        sdk.set_deep_link_result(DeepLinkOutcome {
            uri: Some("myapp://product/7".into()),
            status: DeepLinkStatus::Found,
            ..DeepLinkOutcome::not_found()
        });
        let response = plugin
            .call(MethodCall::new("handleDeepLink", json!({ "url": "https://go.example/p7" })))
            .await
            .expect("response");

        let MethodResponse::Success { result } = response else {
            panic!("expected success");
        };
        assert_eq!(result["deepLink"], "myapp://product/7");
        assert_eq!(result["status"], "found");
        assert!(events.lock().unwrap().is_empty());
        assert!(plugin.deep_link_stream().is_active());
    }
}
