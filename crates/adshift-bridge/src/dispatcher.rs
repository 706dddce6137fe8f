// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call router: method name + raw arguments in, one terminal result out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use adshift_core::codec;
use adshift_core::error::{BridgeError, Result};
use adshift_core::Operation;

use crate::adapter::SdkAdapter;

/// Routes method-channel calls through the codec to the native adapter.
pub struct Dispatcher {
    adapter: Arc<SdkAdapter>,
}

impl Dispatcher {
    pub fn new(adapter: Arc<SdkAdapter>) -> Self {
        Self { adapter }
    }

    /// Decode and execute one call.
    ///
    /// Unknown names fail with [`BridgeError::UnsupportedOperation`] before
    /// anything else happens. Argument errors are reported before the native
    /// SDK is touched. Otherwise the adapter is called exactly once.
    #[instrument(skip(self, args))]
    pub async fn dispatch(&self, method: &str, args: &Value) -> Result<Value> {
        let op = Operation::from_name(method)
            .ok_or_else(|| BridgeError::UnsupportedOperation(method.to_owned()))?;
        let request = codec::decode(op, args)?;
        debug!(operation = %op, "dispatching to native SDK");
        self.adapter.execute(request).await
    }
}
