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
    future::{IntoFuture, Ready},
    ops::{Deref, DerefMut},
    sync::Arc,
};

use weft_core::{Resolvable, Resolve, ResolveClosure, Wait};
use weft_result::WResult;

use crate::{
    api::{
        handlers::{Callback, IntoHandler},
        key_expr::KeyExpr,
        sample::Sample,
        session::{Session, WeakSession, API_DATA_RECEPTION_CHANNEL_SIZE},
        Id,
    },
    net::{
        fabric::{fabric, SubscriberEntry},
        spawn_delivery,
    },
};

/// Whether a subscriber listens to data publications or to liveliness
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubscriberKind {
    Subscriber,
    LivelinessSubscriber,
}

pub(crate) struct SubscriberInner {
    pub(crate) session: WeakSession,
    pub(crate) id: Id,
    pub(crate) key_expr: KeyExpr<'static>,
    pub(crate) undeclare_on_drop: bool,
}

impl Drop for SubscriberInner {
    fn drop(&mut self) {
        if self.undeclare_on_drop {
            if let Err(e) = self.session.undeclare_subscriber_inner(self.id) {
                tracing::error!("error undeclaring subscriber {}: {}", self.id, e);
            }
        }
    }
}

/// A subscriber receiving every [`Sample`] published on a matching key
/// expression.
///
/// Subscribers are declared with a handler: either a channel (the default is
/// a FIFO) whose receiving side the subscriber then [derefs](Deref) to, or a
/// callback invoked for each sample by a dedicated delivery worker. A
/// subscriber undeclares itself when dropped unless it was declared
/// [`background`](crate::api::subscriber::SubscriberBuilder::background).
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let subscriber = session.declare_subscriber("key/expression").await.unwrap();
/// while let Ok(sample) = subscriber.recv_async().await {
///     println!(">> {:?}", sample.payload());
/// }
/// # }
/// ```
pub struct Subscriber<Handler> {
    pub(crate) inner: SubscriberInner,
    pub(crate) handler: Handler,
}

impl<Handler> Subscriber<Handler> {
    /// Returns the key expression this subscriber listens on.
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        &self.inner.key_expr
    }

    /// Returns a reference to this subscriber's handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns a mutable reference to this subscriber's handler.
    pub fn handler_mut(&mut self) -> &mut Handler {
        &mut self.handler
    }
}

impl<Handler: Send> Subscriber<Handler> {
    /// Undeclares this subscriber: its fabric-side entry is removed, its
    /// delivery worker drains what was already queued and its handler is
    /// then released.
    pub fn undeclare(self) -> impl Resolve<WResult<()>> {
        ResolveClosure::new(move || {
            let Subscriber { mut inner, handler } = self;
            inner.undeclare_on_drop = false;
            let result = inner.session.undeclare_subscriber_inner(inner.id);
            drop(handler);
            result
        })
    }
}

impl<Handler> core::fmt::Debug for Subscriber<Handler> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscriber")
            .field("key_expr", &self.inner.key_expr)
            .finish_non_exhaustive()
    }
}

impl<Handler> Deref for Subscriber<Handler> {
    type Target = Handler;

    fn deref(&self) -> &Self::Target {
        self.handler()
    }
}

impl<Handler> DerefMut for Subscriber<Handler> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handler_mut()
    }
}

/// A builder for initializing a [`Subscriber`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct SubscriberBuilder<'a, 'b, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) history: bool,
    pub(crate) undeclare_on_drop: bool,
    pub(crate) handler: Handler,
}

impl<'a, 'b, Handler> SubscriberBuilder<'a, 'b, Handler> {
    /// Receive the samples for this subscription with a callback.
    pub fn callback<F>(self, callback: F) -> SubscriberBuilder<'a, 'b, Callback<Sample>>
    where
        F: Fn(Sample) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the samples for this subscription with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> SubscriberBuilder<'a, 'b, Callback<Sample>>
    where
        F: FnMut(Sample) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the samples for this subscription with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> SubscriberBuilder<'a, 'b, H>
    where
        H: IntoHandler<Sample>,
    {
        SubscriberBuilder {
            session: self.session,
            key_expr: self.key_expr,
            history: self.history,
            undeclare_on_drop: self.undeclare_on_drop,
            handler,
        }
    }

    /// Makes the subscriber deliver the retained last put of every matching
    /// key before any live sample, so late joiners see current state.
    pub fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Makes the subscription outlive the returned [`Subscriber`], until the
    /// session is closed. Mostly useful with callback handlers.
    pub fn background(mut self) -> Self {
        self.undeclare_on_drop = false;
        self
    }
}

impl<Handler> Resolvable for SubscriberBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Sample>,
    Handler::Handler: Send,
{
    type To = WResult<Subscriber<Handler::Handler>>;
}

impl<Handler> Wait for SubscriberBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Sample>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?.into_owned();
        let (callback, receiver) = self.handler.into_handler();
        let id = session.next_id();
        let (queue, task) = spawn_delivery(callback, *API_DATA_RECEPTION_CHANNEL_SIZE);
        fabric().add_subscriber(
            &session.node,
            SubscriberEntry {
                id,
                kind: SubscriberKind::Subscriber,
                key_expr: key_expr.as_owned(),
                queue,
            },
            self.history,
            &session.hlc,
        );
        session.register_task(id, task);
        tracing::trace!("declared subscriber {} on {}", id, key_expr);
        Ok(Subscriber {
            inner: SubscriberInner {
                session,
                id,
                key_expr,
                undeclare_on_drop: self.undeclare_on_drop,
            },
            handler: receiver,
        })
    }
}

impl<Handler> IntoFuture for SubscriberBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Sample>,
    Handler::Handler: Send,
{
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}
