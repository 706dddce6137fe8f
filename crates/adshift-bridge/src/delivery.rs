// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery context: the execution context on which every response and event
// must reach the host.
//
// Host channel implementations are only safe to call from one context
// (typically the UI/main thread). Native completions arrive on arbitrary
// worker threads, so they never call the host directly; they `post` a job
// here and the host drives the `DeliveryLoop` on its main context.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use tracing::{error, trace, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    static IN_DELIVERY: Cell<bool> = const { Cell::new(false) };
}

/// Handle for posting work onto the delivery context. Cheap to clone.
#[derive(Clone)]
pub struct DeliveryContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl DeliveryContext {
    /// Create a context and the loop that must be driven on the target thread.
    pub fn new() -> (Self, DeliveryLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DeliveryLoop { rx })
    }

    /// Queue `job` to run on the delivery context.
    ///
    /// Returns `false` if the loop has been dropped, in which case the job is
    /// discarded.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match self.tx.send(Box::new(job)) {
            Ok(()) => true,
            Err(_) => {
                warn!("delivery loop is gone; discarding job");
                false
            }
        }
    }

    /// Whether the caller is running inside a delivery job.
    pub(crate) fn is_current() -> bool {
        IN_DELIVERY.with(Cell::get)
    }
}

/// Receiving end of a [`DeliveryContext`].
pub struct DeliveryLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl DeliveryLoop {
    /// Run jobs as they arrive until every `DeliveryContext` handle is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            run_job(job);
        }
        trace!("delivery loop finished");
    }

    /// Run every job queued so far without waiting. Returns how many ran.
    ///
    /// For hosts that pump their own main loop and poll once per frame.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            run_job(job);
            ran += 1;
        }
        ran
    }
}

/// Resets the thread-local marker even if the job unwinds.
struct DeliveryScope;

impl DeliveryScope {
    fn enter() -> Self {
        IN_DELIVERY.with(|flag| flag.set(true));
        Self
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        IN_DELIVERY.with(|flag| flag.set(false));
    }
}

fn run_job(job: Job) {
    let _scope = DeliveryScope::enter();
    // A panicking host callback must not take the loop down with it.
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!("delivery job panicked");
    }
}
