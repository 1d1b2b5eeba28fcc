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
    time::Duration,
};

use weft_core::{Resolvable, Resolve, ResolveClosure, Wait};
use weft_result::WResult;

use crate::api::{
    encoding::Encoding,
    handlers::{Callback, DefaultHandler, IntoHandler},
    key_expr::KeyExpr,
    payload::Payload,
    qos::{CongestionControl, Priority},
    query::{QueryConsolidation, QueryTarget, Reply},
    selector::{Parameters, Selector},
    session::{Session, WeakSession},
};

/// A builder for initializing a [`Querier`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct QuerierBuilder<'a, 'b> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) target: QueryTarget,
    pub(crate) consolidation: QueryConsolidation,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) priority: Priority,
    pub(crate) timeout: Duration,
}

impl QuerierBuilder<'_, '_> {
    /// Changes the [`QueryTarget`] of the queries.
    pub fn target(mut self, target: QueryTarget) -> Self {
        self.target = target;
        self
    }

    /// Changes the [`QueryConsolidation`] to apply to the replies.
    pub fn consolidation<QC: Into<QueryConsolidation>>(mut self, consolidation: QC) -> Self {
        self.consolidation = consolidation.into();
        self
    }

    /// Changes the [`CongestionControl`] of the queries: whether they block
    /// or are dropped for a queryable whose queue is full.
    pub fn congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.congestion_control = congestion_control;
        self
    }

    /// Changes the [`Priority`] of the queries. Replies inherit it unless the
    /// replier sets their own.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the timeout applied to every query issued by the querier.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<'b> Resolvable for QuerierBuilder<'_, 'b> {
    type To = WResult<Querier<'b>>;
}

impl Wait for QuerierBuilder<'_, '_> {
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?;
        Ok(Querier {
            session,
            key_expr,
            target: self.target,
            consolidation: self.consolidation,
            congestion_control: self.congestion_control,
            priority: self.priority,
            timeout: self.timeout,
        })
    }
}

impl IntoFuture for QuerierBuilder<'_, '_> {
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

/// A querier issuing queries on the same key expression with pre-set target,
/// consolidation, QoS and timeout.
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let querier = session.declare_querier("key/expression").await.unwrap();
/// let replies = querier.get().await.unwrap();
/// while let Ok(reply) = replies.recv_async().await {
///     println!(">> {:?}", reply.result());
/// }
/// # }
/// ```
pub struct Querier<'a> {
    pub(crate) session: WeakSession,
    pub(crate) key_expr: KeyExpr<'a>,
    pub(crate) target: QueryTarget,
    pub(crate) consolidation: QueryConsolidation,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) priority: Priority,
    pub(crate) timeout: Duration,
}

impl<'a> Querier<'a> {
    /// Returns the key expression this querier queries on.
    pub fn key_expr(&self) -> &KeyExpr<'a> {
        &self.key_expr
    }

    /// Issues a query.
    pub fn get(&self) -> QuerierGetBuilder<'_, DefaultHandler> {
        QuerierGetBuilder {
            querier: self,
            parameters: Parameters::empty(),
            payload: None,
            encoding: None,
            attachment: None,
            handler: DefaultHandler::default(),
        }
    }

    /// Undeclares this querier.
    ///
    /// Queriers keep no fabric-side state, so this only consumes the handle;
    /// it is provided for symmetry with the other entities.
    pub fn undeclare(self) -> impl Resolve<WResult<()>> + 'a {
        ResolveClosure::new(move || {
            drop(self);
            Ok(())
        })
    }
}

impl core::fmt::Debug for Querier<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Querier")
            .field("key_expr", &self.key_expr)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A builder returned by [`Querier::get`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct QuerierGetBuilder<'a, Handler> {
    pub(crate) querier: &'a Querier<'a>,
    pub(crate) parameters: Parameters<'a>,
    pub(crate) payload: Option<Payload>,
    pub(crate) encoding: Option<Encoding>,
    pub(crate) attachment: Option<Payload>,
    pub(crate) handler: Handler,
}

impl<'a, Handler> QuerierGetBuilder<'a, Handler> {
    /// Receive the replies for this query with a callback.
    pub fn callback<F>(self, callback: F) -> QuerierGetBuilder<'a, Callback<Reply>>
    where
        F: Fn(Reply) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the replies for this query with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> QuerierGetBuilder<'a, Callback<Reply>>
    where
        F: FnMut(Reply) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the replies for this query with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> QuerierGetBuilder<'a, H>
    where
        H: IntoHandler<Reply>,
    {
        QuerierGetBuilder {
            querier: self.querier,
            parameters: self.parameters,
            payload: self.payload,
            encoding: self.encoding,
            attachment: self.attachment,
            handler,
        }
    }

    /// Sets the parameters of the query.
    pub fn parameters<P: Into<Parameters<'a>>>(mut self, parameters: P) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Sends a payload along with the query.
    pub fn payload<IntoPayload: Into<Payload>>(mut self, payload: IntoPayload) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Sets the encoding of the query payload.
    pub fn encoding<E: Into<Encoding>>(mut self, encoding: E) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Attaches user-provided bytes to the query.
    pub fn attachment<A: Into<Payload>>(mut self, attachment: A) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

impl<Handler> Resolvable for QuerierGetBuilder<'_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    type To = WResult<Handler::Handler>;
}

impl<Handler> Wait for QuerierGetBuilder<'_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let selector = Selector::new(&self.querier.key_expr, self.parameters);
        let (callback, receiver) = self.handler.into_handler();
        self.querier.session.query(
            selector,
            self.querier.target,
            self.querier.consolidation,
            self.querier.congestion_control,
            self.querier.priority,
            self.querier.timeout,
            self.payload,
            self.encoding,
            self.attachment,
            callback,
        )?;
        Ok(receiver)
    }
}

impl<Handler> IntoFuture for QuerierGetBuilder<'_, Handler>
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
