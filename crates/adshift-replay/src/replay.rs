// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replay session: JSON-lines method calls in, JSON-lines transcript out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use adshift_bridge::{AdshiftPlugin, MethodCall, MethodResponse};
use adshift_core::{BridgeConfig, BridgeError};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delivery loop stopped before {method} was answered")]
    DeliveryStopped { method: String },
}

/// Load a `BridgeConfig` from a JSON file; absent keys take their defaults.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ReplayError> {
    let data = std::fs::read_to_string(path).map_err(|source| ReplayError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ReplayError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Replay every call in `input` in order, waiting for each response before
/// sending the next. Blank lines and `#` comments are skipped.
///
/// Returns the number of calls replayed. The plugin is dropped on return.
pub async fn replay<R>(
    plugin: AdshiftPlugin,
    input: R,
    out: mpsc::UnboundedSender<Value>,
) -> Result<usize, ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let events = out.clone();
    plugin.on_listen(Arc::new(move |event: Value| {
        let _ = events.send(json!({ "event": event }));
    }));

    let mut lines = input.lines();
    let mut calls = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        calls += 1;

        let (method, response) = match serde_json::from_str::<MethodCall>(line) {
            Ok(call) => {
                let method = call.method.clone();
                debug!(%method, line = calls, "replaying call");
                let response = plugin
                    .call(call)
                    .await
                    .map_err(|_| ReplayError::DeliveryStopped {
                        method: method.clone(),
                    })?;
                (Value::String(method), response)
            }
            Err(e) => {
                warn!(line = calls, error = %e, "skipping malformed call");
                let response = MethodResponse::from_result(Err(BridgeError::Decode(e.to_string())));
                (Value::Null, response)
            }
        };

        let _ = out.send(json!({
            "call": calls,
            "method": method,
            "response": response,
        }));
    }

    plugin.on_cancel();
    Ok(calls)
}
