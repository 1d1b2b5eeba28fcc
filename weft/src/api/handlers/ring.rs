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
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, Weak},
    time::{Duration, Instant},
};

use weft_core::wlock;
use weft_result::{werror, WResult};

use crate::api::handlers::{callback::Callback, IntoHandler};

/// A synchronous ring channel with a limited size that allows users to keep
/// the last N data entries, silently dropping the oldest ones on overflow.
pub struct RingChannel {
    capacity: usize,
}

impl RingChannel {
    /// Initializes the `RingChannel` with the capacity size.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

struct RingChannelInner<T> {
    ring: Mutex<VecDeque<T>>,
    // Capacity-1 doorbell: a pending tick means "the ring may be non-empty,
    // look again". The sending end lives in the callback, so dropping the
    // callback disconnects it and unblocks any waiting consumer.
    not_empty: flume::Receiver<()>,
}

impl<T> RingChannelInner<T> {
    fn pull(&self) -> Option<T> {
        wlock!(self.ring).pop_front()
    }
}

/// The receiving end of a [`RingChannel`].
pub struct RingChannelHandler<T> {
    ring: Weak<RingChannelInner<T>>,
}

impl<T> RingChannelHandler<T> {
    fn upgrade(&self) -> WResult<Arc<RingChannelInner<T>>> {
        self.ring
            .upgrade()
            .ok_or_else(|| werror!("the ring channel has been disconnected").into())
    }

    /// Returns the oldest buffered event if any is immediately available.
    pub fn try_recv(&self) -> WResult<Option<T>> {
        Ok(self.upgrade()?.pull())
    }

    /// Blocks until an event is available, or returns an error once the
    /// sending side has been dropped.
    pub fn recv(&self) -> WResult<T> {
        let ring = self.upgrade()?;
        loop {
            if let Some(t) = ring.pull() {
                return Ok(t);
            }
            if ring.not_empty.recv().is_err() {
                return Err(werror!("the ring channel has been disconnected").into());
            }
        }
    }

    /// Blocks until an event is available, up to `deadline`.
    pub fn recv_deadline(&self, deadline: Instant) -> WResult<Option<T>> {
        let ring = self.upgrade()?;
        loop {
            if let Some(t) = ring.pull() {
                return Ok(Some(t));
            }
            match ring.not_empty.recv_deadline(deadline) {
                Ok(()) => {}
                Err(flume::RecvTimeoutError::Timeout) => return Ok(None),
                Err(flume::RecvTimeoutError::Disconnected) => {
                    return Err(werror!("the ring channel has been disconnected").into())
                }
            }
        }
    }

    /// Blocks until an event is available, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> WResult<Option<T>> {
        self.recv_deadline(Instant::now() + timeout)
    }

    /// Asynchronously awaits an event.
    pub async fn recv_async(&self) -> WResult<T> {
        let ring = self.upgrade()?;
        loop {
            if let Some(t) = ring.pull() {
                return Ok(t);
            }
            if ring.not_empty.recv_async().await.is_err() {
                return Err(werror!("the ring channel has been disconnected").into());
            }
        }
    }
}

impl<T: Send + 'static> IntoHandler<T> for RingChannel {
    type Handler = RingChannelHandler<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        let (not_empty_tx, not_empty_rx) = flume::bounded(1);
        let inner = Arc::new(RingChannelInner {
            ring: Mutex::new(VecDeque::with_capacity(self.capacity)),
            not_empty: not_empty_rx,
        });
        let handler = RingChannelHandler {
            ring: Arc::downgrade(&inner),
        };
        let capacity = self.capacity;
        (
            Callback::new(Arc::new(move |t| {
                {
                    let mut ring = wlock!(inner.ring);
                    if ring.len() == capacity {
                        ring.pop_front();
                        tracing::trace!("ring channel is full, dropping the oldest element");
                    }
                    ring.push_back(t);
                }
                let _ = not_empty_tx.try_send(());
            })),
            handler,
        )
    }
}
