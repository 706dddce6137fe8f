// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep-link event stream: one subscriber at a time, one native listener for
// the component's lifetime.
//
// Idle --on_listen--> Active --on_cancel--> Idle
//
// A later `on_listen` replaces the current sink. The native listener is
// installed on the first successful `on_listen` and never removed; after
// `on_cancel`, events still arrive from native code but are dropped.

use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, error, info, warn};

use adshift_core::DeepLinkOutcome;

use crate::adapter::SdkAdapter;
use crate::channel::EventSink;
use crate::delivery::DeliveryContext;
use crate::lock;
use crate::traits::DeepLinkListener;

#[derive(Default)]
struct StreamState {
    sink: Option<Arc<dyn EventSink>>,
    listener_registered: bool,
}

/// Owner of the single deep-link subscription.
pub struct DeepLinkStream {
    adapter: Arc<SdkAdapter>,
    ctx: DeliveryContext,
    state: Arc<Mutex<StreamState>>,
}

impl DeepLinkStream {
    pub fn new(adapter: Arc<SdkAdapter>, ctx: DeliveryContext) -> Self {
        Self {
            adapter,
            ctx,
            state: Arc::new(Mutex::new(StreamState::default())),
        }
    }

    /// Attach `sink` as the subscriber, replacing any previous one.
    pub fn on_listen(&self, sink: Arc<dyn EventSink>) {
        let mut state = lock(&self.state);
        if state.sink.replace(sink).is_some() {
            debug!("replacing active deep-link subscriber");
        }
        if state.listener_registered {
            return;
        }

        match self.adapter.register_deep_link_listener(self.relay()) {
            Ok(()) => {
                state.listener_registered = true;
                info!("native deep-link listener registered");
            }
            // Usually the SDK is not initialised yet; the next listen retries.
            Err(err) => warn!(error = %err, "could not register deep-link listener"),
        }
    }

    /// Detach the current subscriber. The native listener stays installed.
    pub fn on_cancel(&self) {
        if lock(&self.state).sink.take().is_some() {
            debug!("deep-link subscriber detached");
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).sink.is_some()
    }

    pub fn listener_registered(&self) -> bool {
        lock(&self.state).listener_registered
    }

    /// Listener handed to the native SDK. Runs on whatever thread the SDK
    /// calls from; it only flattens the outcome and posts the delivery.
    fn relay(&self) -> DeepLinkListener {
        let state = Arc::downgrade(&self.state);
        let ctx = self.ctx.clone();
        Arc::new(move |outcome: DeepLinkOutcome| {
            let event = match outcome.to_payload().to_value() {
                Ok(event) => event,
                Err(err) => {
                    error!(error = %err, "could not encode deep-link event");
                    return;
                }
            };
            let state = Weak::clone(&state);
            ctx.post(move || deliver(&state, event));
        })
    }
}

/// Runs on the delivery context; the sink is read at delivery time.
fn deliver(state: &Weak<Mutex<StreamState>>, event: serde_json::Value) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let sink = lock(&state).sink.clone();
    match sink {
        Some(sink) => sink.success(event),
        None => debug!("no deep-link subscriber; dropping event"),
    }
}
