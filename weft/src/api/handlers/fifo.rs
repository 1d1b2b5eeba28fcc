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
use std::time::{Duration, Instant};

use crate::api::{
    handlers::{callback::Callback, IntoHandler},
    session::API_DATA_RECEPTION_CHANNEL_SIZE,
};

/// The default handler in weft: a bounded FIFO channel.
///
/// When the channel is full the delivery side applies the publication's
/// congestion control: `Block` publications wait for room, `Drop`
/// publications are discarded for this receiver.
pub struct FifoChannel {
    capacity: usize,
}

impl FifoChannel {
    /// Initializes the `FifoChannel` with the capacity size.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for FifoChannel {
    fn default() -> Self {
        Self::new(*API_DATA_RECEPTION_CHANNEL_SIZE)
    }
}

impl<T: Send + 'static> IntoHandler<T> for FifoChannel {
    type Handler = FifoChannelHandler<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        let (sender, receiver) = flume::bounded(self.capacity);
        let (callback, _) = (sender, ()).into_handler();
        (callback, FifoChannelHandler(receiver))
    }
}

impl<T: Send + 'static> IntoHandler<T> for (flume::Sender<T>, ()) {
    type Handler = ();

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        let (sender, _) = self;
        (
            Callback::new(std::sync::Arc::new(move |t| {
                if let Err(e) = sender.send(t) {
                    tracing::trace!("{}", e);
                }
            })),
            (),
        )
    }
}

/// The receiving end of a [`FifoChannel`].
///
/// Iterating over it yields events until the declaring entity is undeclared
/// (or, for query replies, until the response is complete).
#[derive(Debug, Clone)]
pub struct FifoChannelHandler<T>(flume::Receiver<T>);

impl<T> FifoChannelHandler<T> {
    /// Blocks until an event is available, or returns an error once the
    /// sending side has been dropped and the channel drained.
    pub fn recv(&self) -> Result<T, flume::RecvError> {
        self.0.recv()
    }

    /// Returns an event if one is immediately available.
    pub fn try_recv(&self) -> Result<T, flume::TryRecvError> {
        self.0.try_recv()
    }

    /// Blocks until an event is available, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, flume::RecvTimeoutError> {
        self.0.recv_timeout(timeout)
    }

    /// Blocks until an event is available, up to `deadline`.
    pub fn recv_deadline(&self, deadline: Instant) -> Result<T, flume::RecvTimeoutError> {
        self.0.recv_deadline(deadline)
    }

    /// Asynchronously awaits an event.
    pub async fn recv_async(&self) -> Result<T, flume::RecvError> {
        self.0.recv_async().await
    }

    /// A blocking iterator over the incoming events.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.0.iter()
    }

    /// A non-blocking iterator over the already received events.
    pub fn try_iter(&self) -> impl Iterator<Item = T> + '_ {
        self.0.try_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> IntoIterator for FifoChannelHandler<T> {
    type Item = T;
    type IntoIter = flume::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
