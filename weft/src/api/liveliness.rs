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
    sync::Arc,
    time::{Duration, Instant},
};

use weft_core::{Resolvable, Resolve, ResolveClosure, Wait};
use weft_result::WResult;
use weft_runtime::WRuntime;

use crate::{
    api::{
        error::PublishError,
        handlers::{Callback, DefaultHandler, IntoHandler},
        key_expr::KeyExpr,
        query::Reply,
        sample::{Sample, SampleKind},
        session::{Session, WeakSession, API_DATA_RECEPTION_CHANNEL_SIZE, API_QUERY_TIMEOUT_MS},
        subscriber::{Subscriber, SubscriberInner, SubscriberKind},
        Id,
    },
    net::{
        fabric::{fabric, token_sample, SubscriberEntry, TokenEntry},
        spawn_delivery,
    },
};

/// A structure with functions to declare a [`LivelinessToken`], to query the
/// tokens currently alive and to declare a [`Subscriber`] notified of token
/// arrivals and departures.
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let _token = session
///     .liveliness()
///     .declare_token("group1/member1")
///     .await
///     .unwrap();
/// # }
/// ```
pub struct Liveliness<'a> {
    pub(crate) session: &'a Session,
}

impl<'a> Liveliness<'a> {
    /// Declares a liveliness token on the given (non-wild) key expression.
    ///
    /// The token stays alive until it is undeclared or its session is
    /// closed; both are announced as a delete sample to the matching
    /// liveliness subscribers.
    pub fn declare_token<'b, TryIntoKeyExpr>(
        &self,
        key_expr: TryIntoKeyExpr,
    ) -> LivelinessTokenBuilder<'a, 'b>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        LivelinessTokenBuilder {
            session: self.session,
            key_expr: key_expr.try_into().map_err(Into::into),
            undeclare_on_drop: true,
        }
    }

    /// Declares a subscriber notified with a put sample whenever a matching
    /// liveliness token is declared, and a delete sample whenever one is
    /// undeclared or dies with its session.
    pub fn declare_subscriber<'b, TryIntoKeyExpr>(
        &self,
        key_expr: TryIntoKeyExpr,
    ) -> LivelinessSubscriberBuilder<'a, 'b, DefaultHandler>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        LivelinessSubscriberBuilder {
            session: self.session,
            key_expr: key_expr.try_into().map_err(Into::into),
            history: false,
            undeclare_on_drop: true,
            handler: DefaultHandler::default(),
        }
    }

    /// Queries the liveliness tokens currently alive on a matching key
    /// expression. Each is returned as a put [`Reply`].
    pub fn get<'b, TryIntoKeyExpr>(
        &self,
        key_expr: TryIntoKeyExpr,
    ) -> LivelinessGetBuilder<'a, 'b, DefaultHandler>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        LivelinessGetBuilder {
            session: self.session,
            key_expr: key_expr.try_into().map_err(Into::into),
            timeout: Duration::from_millis(*API_QUERY_TIMEOUT_MS),
            handler: DefaultHandler::default(),
        }
    }
}

/// A builder for initializing a [`LivelinessToken`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct LivelinessTokenBuilder<'a, 'b> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) undeclare_on_drop: bool,
}

impl LivelinessTokenBuilder<'_, '_> {
    /// Makes the token outlive the returned [`LivelinessToken`], until the
    /// session is closed.
    pub fn background(mut self) -> Self {
        self.undeclare_on_drop = false;
        self
    }
}

impl Resolvable for LivelinessTokenBuilder<'_, '_> {
    type To = WResult<LivelinessToken>;
}

impl Wait for LivelinessTokenBuilder<'_, '_> {
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?.into_owned();
        if key_expr.is_wild() {
            return Err(PublishError::new(format!(
                "cannot declare a liveliness token on the wild key expression {}",
                key_expr
            ))
            .into());
        }
        let id = session.next_id();
        fabric().add_token(
            &session.node,
            TokenEntry {
                id,
                key_expr: key_expr.as_owned(),
            },
            &session.hlc,
        );
        tracing::trace!("declared liveliness token {} on {}", id, key_expr);
        Ok(LivelinessToken {
            session,
            id,
            key_expr,
            undeclare_on_drop: self.undeclare_on_drop,
        })
    }
}

impl IntoFuture for LivelinessTokenBuilder<'_, '_> {
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

/// A token whose liveliness is tied to its session: matching liveliness
/// subscribers see it appear when it is declared and disappear when it is
/// undeclared, dropped, or its session closes.
pub struct LivelinessToken {
    session: WeakSession,
    id: Id,
    key_expr: KeyExpr<'static>,
    undeclare_on_drop: bool,
}

impl LivelinessToken {
    /// Returns the key expression of this token.
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        &self.key_expr
    }

    /// Undeclares this token, announcing its departure to the matching
    /// liveliness subscribers.
    pub fn undeclare(mut self) -> impl Resolve<WResult<()>> {
        ResolveClosure::new(move || {
            self.undeclare_on_drop = false;
            self.session.undeclare_token_inner(self.id)
        })
    }
}

impl Drop for LivelinessToken {
    fn drop(&mut self) {
        if self.undeclare_on_drop {
            if let Err(e) = self.session.undeclare_token_inner(self.id) {
                tracing::error!("error undeclaring liveliness token {}: {}", self.id, e);
            }
        }
    }
}

impl core::fmt::Debug for LivelinessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LivelinessToken")
            .field("key_expr", &self.key_expr)
            .finish_non_exhaustive()
    }
}

/// A builder for initializing a liveliness [`Subscriber`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct LivelinessSubscriberBuilder<'a, 'b, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) history: bool,
    pub(crate) undeclare_on_drop: bool,
    pub(crate) handler: Handler,
}

impl<'a, 'b, Handler> LivelinessSubscriberBuilder<'a, 'b, Handler> {
    /// Receive the liveliness changes with a callback.
    pub fn callback<F>(self, callback: F) -> LivelinessSubscriberBuilder<'a, 'b, Callback<Sample>>
    where
        F: Fn(Sample) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the liveliness changes with a mutable callback.
    pub fn callback_mut<F>(
        self,
        callback: F,
    ) -> LivelinessSubscriberBuilder<'a, 'b, Callback<Sample>>
    where
        F: FnMut(Sample) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the liveliness changes with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> LivelinessSubscriberBuilder<'a, 'b, H>
    where
        H: IntoHandler<Sample>,
    {
        LivelinessSubscriberBuilder {
            session: self.session,
            key_expr: self.key_expr,
            history: self.history,
            undeclare_on_drop: self.undeclare_on_drop,
            handler,
        }
    }

    /// Makes the subscriber start with a put sample for every matching token
    /// already alive, before any live change.
    pub fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Makes the subscription outlive the returned [`Subscriber`], until the
    /// session is closed.
    pub fn background(mut self) -> Self {
        self.undeclare_on_drop = false;
        self
    }
}

impl<Handler> Resolvable for LivelinessSubscriberBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Sample>,
    Handler::Handler: Send,
{
    type To = WResult<Subscriber<Handler::Handler>>;
}

impl<Handler> Wait for LivelinessSubscriberBuilder<'_, '_, Handler>
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
                kind: SubscriberKind::LivelinessSubscriber,
                key_expr: key_expr.as_owned(),
                queue,
            },
            self.history,
            &session.hlc,
        );
        session.register_task(id, task);
        tracing::trace!("declared liveliness subscriber {} on {}", id, key_expr);
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

impl<Handler> IntoFuture for LivelinessSubscriberBuilder<'_, '_, Handler>
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

/// A builder returned by [`Liveliness::get`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct LivelinessGetBuilder<'a, 'b, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) timeout: Duration,
    pub(crate) handler: Handler,
}

impl<'a, 'b, Handler> LivelinessGetBuilder<'a, 'b, Handler> {
    /// Receive the replies with a callback.
    pub fn callback<F>(self, callback: F) -> LivelinessGetBuilder<'a, 'b, Callback<Reply>>
    where
        F: Fn(Reply) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the replies with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> LivelinessGetBuilder<'a, 'b, Callback<Reply>>
    where
        F: FnMut(Reply) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the replies with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> LivelinessGetBuilder<'a, 'b, H>
    where
        H: IntoHandler<Reply>,
    {
        LivelinessGetBuilder {
            session: self.session,
            key_expr: self.key_expr,
            timeout: self.timeout,
            handler,
        }
    }

    /// Sets the query timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<Handler> Resolvable for LivelinessGetBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    type To = WResult<Handler::Handler>;
}

impl<Handler> Wait for LivelinessGetBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?;
        let tokens = fabric().live_tokens(&key_expr);
        let (callback, receiver) = self.handler.into_handler();
        let timeout = self.timeout;
        // The snapshot is already taken; replies are delivered off the
        // caller's context like any other query response, cut off at the
        // deadline if a slow consumer holds the delivery up.
        WRuntime::Net.spawn(async move {
            let deadline = Instant::now() + timeout;
            for (replier_id, key_expr) in tokens {
                if Instant::now() >= deadline {
                    tracing::trace!("liveliness query timed out, cutting the response off");
                    break;
                }
                callback.call(Reply {
                    result: Ok(token_sample(key_expr, SampleKind::Put, &session.hlc)),
                    replier_id: Some(replier_id),
                });
            }
        });
        Ok(receiver)
    }
}

impl<Handler> IntoFuture for LivelinessGetBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}
