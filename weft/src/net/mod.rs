//
// Copyright (c) 2024 ZettaScale Technology
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ZettaScale Zenoh Team, <zenoh@zettascale.tech>
//
use std::panic::AssertUnwindSafe;

use tokio_util::sync::CancellationToken;
use weft_runtime::{TerminatableTask, WRuntime};

use crate::api::handlers::Callback;

pub(crate) mod fabric;

/// Spawns the delivery worker backing a declared entity.
///
/// Events routed to the entity are enqueued on the returned sender and
/// handed to `callback` one at a time, in queue order, by a dedicated task.
/// Cancelling the task (or dropping all senders) drains what was already
/// queued, then drops the callback, releasing the user's handler.
pub(crate) fn spawn_delivery<T: Send + 'static>(
    callback: Callback<T>,
    capacity: usize,
) -> (flume::Sender<T>, TerminatableTask) {
    let (tx, rx) = flume::bounded(capacity);
    let token = TerminatableTask::create_cancellation_token();
    let task = TerminatableTask::spawn(
        WRuntime::Application,
        delivery_task(rx, callback, token.clone()),
        token,
    );
    (tx, task)
}

async fn delivery_task<T: Send>(
    rx: flume::Receiver<T>,
    callback: Callback<T>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            msg = rx.recv_async() => match msg {
                Ok(msg) => invoke(&callback, msg),
                Err(_) => break,
            },
            _ = token.cancelled() => {
                // Drain what was already queued before tearing down.
                while let Ok(msg) = rx.try_recv() {
                    invoke(&callback, msg);
                }
                break;
            }
        }
    }
}

// A panicking handler must not take its delivery worker down with it.
fn invoke<T>(callback: &Callback<T>, msg: T) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| callback.call(msg))).is_err() {
        tracing::error!("a handler panicked, the event was lost");
    }
}
