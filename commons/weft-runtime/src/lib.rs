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

//! ⚠️ WARNING ⚠️
//!
//! This crate is intended for weft's internal use.
//!
//! [Click here for weft's documentation](https://docs.rs/weft/latest/weft)
use std::{future::Future, sync::OnceLock, time::Duration};

use tokio::{runtime::Runtime, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use weft_core::wconfigurable;

wconfigurable! {
    /// Worker threads of the shared delivery runtime.
    pub static ref WEFT_RUNTIME_THREADS: usize = 2;
}

/// The shared runtimes weft spawns its internal tasks on.
///
/// These are lazily initialized statics, so that the synchronous `wait()`
/// resolution path works from any thread, whether or not the caller runs its
/// own tokio runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WRuntime {
    /// Event delivery towards user handlers.
    Application,
    /// Fabric-side plumbing: query forwarding, scouting, timeouts.
    Net,
}

impl WRuntime {
    fn handle(&self) -> &'static tokio::runtime::Handle {
        match self {
            WRuntime::Application => {
                static RT: OnceLock<Runtime> = OnceLock::new();
                RT.get_or_init(|| build_runtime("weft-app")).handle()
            }
            WRuntime::Net => {
                static RT: OnceLock<Runtime> = OnceLock::new();
                RT.get_or_init(|| build_runtime("weft-net")).handle()
            }
        }
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle().spawn(future)
    }

    /// Runs `future` to completion from the current thread.
    ///
    /// Safe to call both from within a tokio runtime (blocks in place) and
    /// from a plain thread.
    pub fn block_in_place<F, T>(&self, future: F) -> T
    where
        F: Future<Output = T>,
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::task::block_in_place(|| self.handle().block_on(future))
        } else {
            self.handle().block_on(future)
        }
    }
}

fn build_runtime(name: &str) -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(*WEFT_RUNTIME_THREADS)
        .enable_time()
        .thread_name(name)
        .build()
        .expect("failed to build weft runtime")
}

/// A task that can be cancelled and joined with a bounded grace period.
pub struct TerminatableTask {
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl TerminatableTask {
    pub fn create_cancellation_token() -> CancellationToken {
        CancellationToken::new()
    }

    /// Spawns `future` on `rt`. The task is expected to observe `token` and
    /// return promptly once it is cancelled.
    pub fn spawn<F>(rt: WRuntime, future: F, token: CancellationToken) -> TerminatableTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TerminatableTask {
            handle: Some(rt.spawn(future)),
            token,
        }
    }

    /// Cancels the task and waits for it to finish, up to `timeout`.
    ///
    /// Returns `false` if the task had to be abandoned still running.
    pub fn terminate(mut self, timeout: Duration) -> bool {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let joined = WRuntime::Net
                .block_in_place(async move { tokio::time::timeout(timeout, handle).await });
            if joined.is_err() {
                tracing::error!("A terminatable task is not terminating!");
                return false;
            }
        }
        true
    }

    /// Cancels the task and waits for it to finish, up to `timeout`.
    pub async fn terminate_async(mut self, timeout: Duration) -> bool {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                tracing::error!("A terminatable task is not terminating!");
                return false;
            }
        }
        true
    }
}

impl Drop for TerminatableTask {
    fn drop(&mut self) {
        // Detached, not aborted: the task exits on its own once cancelled.
        self.token.cancel();
    }
}

impl std::fmt::Debug for TerminatableTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminatableTask").finish()
    }
}
