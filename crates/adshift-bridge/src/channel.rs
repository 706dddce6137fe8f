// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-facing channel types: method calls in, exactly one response out, and
// the sink that receives deep-link events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error};
use uuid::Uuid;

use adshift_core::error::Result;
use adshift_core::{ErrorPayload, Operation};

use crate::delivery::DeliveryContext;

/// A call received on the method channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Terminal response to a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MethodResponse {
    Success { result: Value },
    Error(ErrorPayload),
    /// The method name is not part of the bridge vocabulary.
    NotImplemented,
}

impl MethodResponse {
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(result) => Self::Success { result },
            Err(err) => match err.payload() {
                Some(payload) => Self::Error(payload),
                None => Self::NotImplemented,
            },
        }
    }
}

type Reply = Box<dyn FnOnce(MethodResponse) + Send + 'static>;

/// One-shot token for an in-flight call.
///
/// `resolve` consumes the token, so a call cannot be answered twice. A token
/// dropped without being resolved answers with an error (or "not implemented"
/// for unknown methods), so a call is never left hanging. Either way the
/// reply runs on the delivery context.
pub struct PendingCall {
    id: Uuid,
    method: String,
    ctx: DeliveryContext,
    reply: Option<Reply>,
}

impl PendingCall {
    pub fn new(
        method: impl Into<String>,
        ctx: DeliveryContext,
        reply: impl FnOnce(MethodResponse) + Send + 'static,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.into(),
            ctx,
            reply: Some(Box::new(reply)),
        }
    }

    /// Pending call whose response is forwarded to a oneshot receiver.
    pub fn channel(
        method: impl Into<String>,
        ctx: DeliveryContext,
    ) -> (Self, oneshot::Receiver<MethodResponse>) {
        let (tx, rx) = oneshot::channel();
        let call = Self::new(method, ctx, move |response| {
            let _ = tx.send(response);
        });
        (call, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn resolve(mut self, response: MethodResponse) {
        self.deliver(response);
    }

    fn deliver(&mut self, response: MethodResponse) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        debug!(call_id = %self.id, method = %self.method, "posting response");
        self.ctx.post(move || reply(response));
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if self.reply.is_none() {
            return;
        }
        error!(call_id = %self.id, method = %self.method, "pending call dropped unresolved");
        let response = match Operation::from_name(&self.method) {
            Some(op) => MethodResponse::Error(ErrorPayload {
                code: op.error_code().as_str().to_owned(),
                message: format!("{op} was abandoned before completing"),
                detail: None,
            }),
            None => MethodResponse::NotImplemented,
        };
        self.deliver(response);
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("resolved", &self.reply.is_none())
            .finish()
    }
}

/// Receiver of deep-link events on the event channel, implemented by the host.
/// Only ever invoked on the delivery context.
pub trait EventSink: Send + Sync {
    fn success(&self, event: Value);
}

impl<F> EventSink for F
where
    F: Fn(Value) + Send + Sync,
{
    fn success(&self, event: Value) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adshift_core::BridgeError;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn response_from_result() {
        assert_eq!(
            MethodResponse::from_result(Ok(Value::Bool(true))),
            MethodResponse::Success {
                result: Value::Bool(true)
            }
        );
        assert!(matches!(
            MethodResponse::from_result(Err(BridgeError::invalid("userId"))),
            MethodResponse::Error(ErrorPayload { ref code, .. }) if code == "INVALID_ARGS"
        ));
        assert_eq!(
            MethodResponse::from_result(Err(BridgeError::UnsupportedOperation("x".into()))),
            MethodResponse::NotImplemented
        );
    }

    #[test]
    fn response_wire_shape() {
        let value = serde_json::to_value(MethodResponse::Error(ErrorPayload {
            code: "START_ERROR".into(),
            message: "offline".into(),
            detail: Some("-1009".into()),
        }))
        .expect("serialize");
        assert_eq!(
            value,
            json!({ "type": "error", "code": "START_ERROR", "message": "offline", "detail": "-1009" })
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::NotImplemented).expect("serialize"),
            json!({ "type": "notImplemented" })
        );
    }

    #[test]
    fn method_call_arguments_default_to_null() {
        let call: MethodCall = serde_json::from_str(r#"{"method":"start"}"#).expect("parse");
        assert_eq!(call, MethodCall::new("start", Value::Null));
    }

    #[tokio::test]
    async fn pending_calls_carry_distinct_ids() {
        let (ctx, mut delivery) = DeliveryContext::new();
        let (first, _rx1) = PendingCall::channel("start", ctx.clone());
        let (second, _rx2) = PendingCall::channel("start", ctx);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.method(), "start");

        first.resolve(MethodResponse::Success { result: Value::Null });
        second.resolve(MethodResponse::Success { result: Value::Null });
        assert_eq!(delivery.run_pending(), 2);
    }

    #[tokio::test]
    async fn resolution_runs_on_delivery_context() {
        let (ctx, mut delivery) = DeliveryContext::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let call = PendingCall::new("stop", ctx, move |response| {
            sink.lock().unwrap().push((response, DeliveryContext::is_current()));
        });

        std::thread::spawn(move || call.resolve(MethodResponse::Success { result: Value::Null }))
            .join()
            .expect("worker");

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(delivery.run_pending(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(MethodResponse::Success { result: Value::Null }, true)]
        );
    }

    #[tokio::test]
    async fn dropped_call_resolves_with_family_error() {
        let (ctx, mut delivery) = DeliveryContext::new();
        let (call, rx) = PendingCall::channel("trackEvent", ctx);
        drop(call);

        assert_eq!(delivery.run_pending(), 1);
        match rx.await.expect("response") {
            MethodResponse::Error(payload) => assert_eq!(payload.code, "TRACK_ERROR"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_unknown_call_is_not_implemented() {
        let (ctx, mut delivery) = DeliveryContext::new();
        let (call, rx) = PendingCall::channel("frobnicate", ctx);
        drop(call);
        delivery.run_pending();
        assert_eq!(rx.await.expect("response"), MethodResponse::NotImplemented);
    }

    #[tokio::test]
    async fn resolved_call_is_delivered_once() {
        let (ctx, mut delivery) = DeliveryContext::new();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let call = PendingCall::new("start", ctx, move |_| *counter.lock().unwrap() += 1);
        call.resolve(MethodResponse::Success { result: Value::Null });

        assert_eq!(delivery.run_pending(), 1);
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
