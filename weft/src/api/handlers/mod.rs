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

//! Callback handler trait.
mod callback;
mod fifo;
mod ring;

pub use callback::*;
pub use fifo::*;
pub use ring::*;

/// A trait for types that can be used to handle a stream of `T` events.
///
/// An implementer is converted into a pair of a [`Callback`], which the
/// fabric's delivery workers invoke for each event, and a handler, which is
/// given back to the user as the receiving side (e.g. a channel receiver).
/// Pure callbacks have `()` as their handler type.
pub trait IntoHandler<T> {
    type Handler: Send;

    /// `true` for handlers that only make sense while declared, i.e. pure
    /// callbacks with no receiving side to keep alive.
    const BACKGROUND: bool = false;

    /// Converts `self` into a callback/handler pair.
    fn into_handler(self) -> (Callback<T>, Self::Handler);
}

/// The default handler in weft: a FIFO channel.
#[derive(Default)]
pub struct DefaultHandler(FifoChannel);

impl<T: Send + 'static> IntoHandler<T> for DefaultHandler {
    type Handler = <FifoChannel as IntoHandler<T>>::Handler;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        self.0.into_handler()
    }
}

impl<T: Send + 'static> IntoHandler<T> for (flume::Sender<T>, flume::Receiver<T>) {
    type Handler = flume::Receiver<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        let (sender, receiver) = self;
        (
            Callback::new(std::sync::Arc::new(move |t| {
                if let Err(e) = sender.send(t) {
                    tracing::error!("{}", e);
                }
            })),
            receiver,
        )
    }
}

impl<T: Send + 'static> IntoHandler<T>
    for (std::sync::mpsc::SyncSender<T>, std::sync::mpsc::Receiver<T>)
{
    type Handler = std::sync::mpsc::Receiver<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        let (sender, receiver) = self;
        (
            Callback::new(std::sync::Arc::new(move |t| {
                if let Err(e) = sender.send(t) {
                    tracing::error!("{}", e);
                }
            })),
            receiver,
        )
    }
}
