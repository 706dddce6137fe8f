// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// adshift-replay: drives the bridge end to end on desktop/CI.
//
// Reads one JSON method call per line from stdin, passes each through the
// plugin backed by the in-memory SDK and prints responses and deep-link
// events as JSON lines on stdout. Logs go to stderr.
//
//   adshift-replay [CONFIG] < calls.jsonl

mod replay;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use adshift_bridge::{AdshiftPlugin, DeliveryContext, StubSdk};
use adshift_core::BridgeConfig;

use replay::{load_config, replay};

#[derive(Parser, Debug)]
#[command(
    name = "adshift-replay",
    version,
    about = "Replay JSON-lines method calls through the AdShift bridge",
    long_about = "Reads one method call per line from stdin, runs it through the \
                  bridge backed by the in-memory SDK and prints responses and \
                  deep-link events as JSON lines on stdout. Logs go to stderr."
)]
struct Args {
    /// JSON bridge config; absent keys take their defaults
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match args.config.as_deref().map(load_config) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            eprintln!("adshift-replay: {e}");
            return ExitCode::FAILURE;
        }
        None => BridgeConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("adshift-replay starting");

    // This task is the main context: every response and event is delivered
    // here, while native work runs on spawned tasks.
    let (ctx, delivery) = DeliveryContext::new();
    let sdk = Arc::new(StubSdk::new(config.stub.clone()));
    let plugin = AdshiftPlugin::new(sdk, config, ctx, Handle::current());

    let (out, mut lines) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            println!("{line}");
        }
    });

    let session = tokio::spawn(replay(plugin, BufReader::new(tokio::io::stdin()), out));

    // Ends once the session has dropped the plugin and with it every handle
    // to the delivery context.
    delivery.run().await;

    let outcome = match session.await {
        Ok(Ok(calls)) => {
            tracing::info!(calls, "replay finished");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "replay failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "replay task aborted");
            ExitCode::FAILURE
        }
    };

    if let Err(e) = printer.await {
        tracing::error!(error = %e, "output task aborted");
    }
    outcome
}
