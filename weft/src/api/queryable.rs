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
    fmt,
    future::{IntoFuture, Ready},
    ops::{Deref, DerefMut},
    sync::Arc,
};

use weft_core::{Resolvable, Resolve, ResolveClosure, Wait};
use weft_result::WResult;

use crate::{
    api::{
        encoding::Encoding,
        error::PublishError,
        handlers::{Callback, IntoHandler},
        info::WeftId,
        key_expr::KeyExpr,
        payload::Payload,
        qos::{CongestionControl, Priority},
        query::{Reply, ReplyError},
        sample::{Sample, SampleKind, Timestamp},
        selector::{Parameters, Selector},
        session::{Session, WeakSession, API_QUERY_RECEPTION_CHANNEL_SIZE},
        Id,
    },
    net::{
        fabric::{fabric, QueryableEntry},
        spawn_delivery,
    },
};

pub(crate) struct QueryInner {
    pub(crate) key_expr: KeyExpr<'static>,
    pub(crate) parameters: Parameters<'static>,
    pub(crate) payload: Option<Payload>,
    pub(crate) encoding: Option<Encoding>,
    pub(crate) attachment: Option<Payload>,
    /// The priority the requester asked for; replies inherit it unless the
    /// replier sets their own.
    pub(crate) priority: Priority,
    /// Dropping the last clone of this sender is what tells the requester
    /// the response is complete.
    pub(crate) replies: flume::Sender<Reply>,
    pub(crate) replier_id: WeftId,
}

/// A query received by a [`Queryable`].
///
/// The query stays answerable as long as it (or a clone of it) is alive:
/// replies may be sent from any task, at any time, until the last clone is
/// dropped, which finalizes the response.
#[derive(Clone)]
pub struct Query {
    pub(crate) inner: Arc<QueryInner>,
}

impl Query {
    /// The full [`Selector`] of this query.
    pub fn selector(&self) -> Selector<'_> {
        Selector::new(&self.inner.key_expr, self.inner.parameters.as_str())
    }

    /// The key expression part of this query.
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        &self.inner.key_expr
    }

    /// The parameters part of this query.
    pub fn parameters(&self) -> &Parameters<'static> {
        &self.inner.parameters
    }

    /// The payload the querier sent along, if any.
    pub fn payload(&self) -> Option<&Payload> {
        self.inner.payload.as_ref()
    }

    /// The encoding of the query payload, if any.
    pub fn encoding(&self) -> Option<&Encoding> {
        self.inner.encoding.as_ref()
    }

    /// The attachment the querier sent along, if any.
    pub fn attachment(&self) -> Option<&Payload> {
        self.inner.attachment.as_ref()
    }

    /// Sends a put reply carrying a data payload for `key_expr`.
    ///
    /// The replied key expression must be non-wild and should intersect the
    /// query's own key expression; the requester sees it as the key of the
    /// reply sample.
    pub fn reply<'b, TryIntoKeyExpr, IntoPayload>(
        &self,
        key_expr: TryIntoKeyExpr,
        payload: IntoPayload,
    ) -> ReplyBuilder<'_, 'b, ReplyBuilderPut>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
        IntoPayload: Into<Payload>,
    {
        ReplyBuilder {
            query: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            kind: ReplyBuilderPut {
                payload: payload.into(),
                encoding: Encoding::default(),
            },
            timestamp: None,
            priority: None,
            congestion_control: CongestionControl::Block,
            attachment: None,
        }
    }

    /// Sends a delete reply, notifying the requester that the resource at
    /// `key_expr` does not exist.
    pub fn reply_del<'b, TryIntoKeyExpr>(
        &self,
        key_expr: TryIntoKeyExpr,
    ) -> ReplyBuilder<'_, 'b, ReplyBuilderDelete>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        ReplyBuilder {
            query: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            kind: ReplyBuilderDelete,
            timestamp: None,
            priority: None,
            congestion_control: CongestionControl::Block,
            attachment: None,
        }
    }

    /// Sends an error reply.
    ///
    /// Error replies bypass the requester's consolidation and are always
    /// delivered.
    pub fn reply_err<IntoPayload>(&self, payload: IntoPayload) -> ReplyErrBuilder<'_>
    where
        IntoPayload: Into<Payload>,
    {
        ReplyErrBuilder {
            query: self,
            payload: payload.into(),
            encoding: Encoding::default(),
        }
    }

    fn send_reply(&self, reply: Reply) {
        // A disconnect means the requester timed out or was closed.
        if self.inner.replies.send(reply).is_err() {
            tracing::trace!("reply to {} dropped: the requester is gone", self.inner.key_expr);
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key_expr", &self.inner.key_expr)
            .field("parameters", &self.inner.parameters)
            .finish_non_exhaustive()
    }
}

/// The data of a put reply.
#[derive(Debug, Clone)]
pub struct ReplyBuilderPut {
    payload: Payload,
    encoding: Encoding,
}

/// The marker of a delete reply.
#[derive(Debug, Clone, Copy)]
pub struct ReplyBuilderDelete;

/// A builder returned by [`Query::reply`] and [`Query::reply_del`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct ReplyBuilder<'a, 'b, T> {
    query: &'a Query,
    key_expr: WResult<KeyExpr<'b>>,
    kind: T,
    timestamp: Option<Timestamp>,
    priority: Option<Priority>,
    congestion_control: CongestionControl,
    attachment: Option<Payload>,
}

impl<T> ReplyBuilder<'_, '_, T> {
    /// Sets an explicit timestamp on the reply. Replies without one are
    /// stamped by the requester on reception.
    pub fn timestamp<TS: Into<Option<Timestamp>>>(mut self, timestamp: TS) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Sets the [`Priority`] carried on the reply sample, overriding the one
    /// inherited from the query.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the [`CongestionControl`] carried on the reply sample.
    pub fn congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.congestion_control = congestion_control;
        self
    }

    /// Attaches user-provided bytes to the reply.
    pub fn attachment<A: Into<Payload>>(mut self, attachment: A) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

impl ReplyBuilder<'_, '_, ReplyBuilderPut> {
    /// Sets the encoding of the reply payload.
    pub fn encoding<E: Into<Encoding>>(mut self, encoding: E) -> Self {
        self.kind.encoding = encoding.into();
        self
    }
}

impl<T> Resolvable for ReplyBuilder<'_, '_, T> {
    type To = WResult<()>;
}

impl Wait for ReplyBuilder<'_, '_, ReplyBuilderPut> {
    fn wait(self) -> Self::To {
        let key_expr = self.key_expr?;
        reply_sample(
            self.query,
            key_expr,
            self.kind.payload,
            SampleKind::Put,
            self.kind.encoding,
            self.timestamp,
            self.priority,
            self.congestion_control,
            self.attachment,
        )
    }
}

impl Wait for ReplyBuilder<'_, '_, ReplyBuilderDelete> {
    fn wait(self) -> Self::To {
        let key_expr = self.key_expr?;
        reply_sample(
            self.query,
            key_expr,
            Payload::empty(),
            SampleKind::Delete,
            Encoding::default(),
            self.timestamp,
            self.priority,
            self.congestion_control,
            self.attachment,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn reply_sample(
    query: &Query,
    key_expr: KeyExpr<'_>,
    payload: Payload,
    kind: SampleKind,
    encoding: Encoding,
    timestamp: Option<Timestamp>,
    priority: Option<Priority>,
    congestion_control: CongestionControl,
    attachment: Option<Payload>,
) -> WResult<()> {
    if key_expr.is_wild() {
        return Err(PublishError::new(format!(
            "cannot reply on the wild key expression {}",
            key_expr
        ))
        .into());
    }
    query.send_reply(Reply {
        result: Ok(Sample {
            key_expr: key_expr.into_owned(),
            payload,
            kind,
            encoding,
            timestamp,
            priority: priority.unwrap_or(query.inner.priority),
            congestion_control,
            attachment,
        }),
        replier_id: Some(query.inner.replier_id),
    });
    Ok(())
}

impl<T> IntoFuture for ReplyBuilder<'_, '_, T>
where
    Self: Wait + Resolvable<To = WResult<()>>,
{
    type Output = WResult<()>;
    type IntoFuture = Ready<WResult<()>>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

/// A builder returned by [`Query::reply_err`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct ReplyErrBuilder<'a> {
    query: &'a Query,
    payload: Payload,
    encoding: Encoding,
}

impl ReplyErrBuilder<'_> {
    /// Sets the encoding of the error payload.
    pub fn encoding<E: Into<Encoding>>(mut self, encoding: E) -> Self {
        self.encoding = encoding.into();
        self
    }
}

impl Resolvable for ReplyErrBuilder<'_> {
    type To = WResult<()>;
}

impl Wait for ReplyErrBuilder<'_> {
    fn wait(self) -> Self::To {
        self.query.send_reply(Reply {
            result: Err(ReplyError {
                payload: self.payload,
                encoding: self.encoding,
            }),
            replier_id: Some(self.query.inner.replier_id),
        });
        Ok(())
    }
}

impl IntoFuture for ReplyErrBuilder<'_> {
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

pub(crate) struct QueryableInner {
    pub(crate) session: WeakSession,
    pub(crate) id: Id,
    pub(crate) key_expr: KeyExpr<'static>,
    pub(crate) undeclare_on_drop: bool,
}

impl Drop for QueryableInner {
    fn drop(&mut self) {
        if self.undeclare_on_drop {
            if let Err(e) = self.session.undeclare_queryable_inner(self.id) {
                tracing::error!("error undeclaring queryable {}: {}", self.id, e);
            }
        }
    }
}

/// A queryable answering the [`Query`]s whose selector matches its key
/// expression.
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let queryable = session.declare_queryable("key/expression").await.unwrap();
/// while let Ok(query) = queryable.recv_async().await {
///     query.reply("key/expression", "answer").await.unwrap();
/// }
/// # }
/// ```
pub struct Queryable<Handler> {
    pub(crate) inner: QueryableInner,
    pub(crate) handler: Handler,
}

impl<Handler> Queryable<Handler> {
    /// Returns the key expression this queryable answers on.
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        &self.inner.key_expr
    }

    /// Returns a reference to this queryable's handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns a mutable reference to this queryable's handler.
    pub fn handler_mut(&mut self) -> &mut Handler {
        &mut self.handler
    }
}

impl<Handler: Send> Queryable<Handler> {
    /// Undeclares this queryable. Queries already queued are still handed to
    /// the handler before it is released.
    pub fn undeclare(self) -> impl Resolve<WResult<()>> {
        ResolveClosure::new(move || {
            let Queryable { mut inner, handler } = self;
            inner.undeclare_on_drop = false;
            let result = inner.session.undeclare_queryable_inner(inner.id);
            drop(handler);
            result
        })
    }
}

impl<Handler> Deref for Queryable<Handler> {
    type Target = Handler;

    fn deref(&self) -> &Self::Target {
        self.handler()
    }
}

impl<Handler> DerefMut for Queryable<Handler> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handler_mut()
    }
}

/// A builder for initializing a [`Queryable`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct QueryableBuilder<'a, 'b, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) complete: bool,
    pub(crate) undeclare_on_drop: bool,
    pub(crate) handler: Handler,
}

impl<'a, 'b, Handler> QueryableBuilder<'a, 'b, Handler> {
    /// Receive the queries for this queryable with a callback.
    pub fn callback<F>(self, callback: F) -> QueryableBuilder<'a, 'b, Callback<Query>>
    where
        F: Fn(Query) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the queries for this queryable with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> QueryableBuilder<'a, 'b, Callback<Query>>
    where
        F: FnMut(Query) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the queries for this queryable with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> QueryableBuilder<'a, 'b, H>
    where
        H: IntoHandler<Query>,
    {
        QueryableBuilder {
            session: self.session,
            key_expr: self.key_expr,
            complete: self.complete,
            undeclare_on_drop: self.undeclare_on_drop,
            handler,
        }
    }

    /// Advertises this queryable as holding the complete data set for its
    /// key expression, making it eligible as a sole target for
    /// `BestMatching` queries.
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// Makes the queryable outlive the returned [`Queryable`], until the
    /// session is closed. Mostly useful with callback handlers.
    pub fn background(mut self) -> Self {
        self.undeclare_on_drop = false;
        self
    }
}

impl<Handler> Resolvable for QueryableBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Query>,
    Handler::Handler: Send,
{
    type To = WResult<Queryable<Handler::Handler>>;
}

impl<Handler> Wait for QueryableBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Query>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?.into_owned();
        let (callback, receiver) = self.handler.into_handler();
        let id = session.next_id();
        let (queue, task) = spawn_delivery(callback, *API_QUERY_RECEPTION_CHANNEL_SIZE);
        fabric().add_queryable(
            &session.node,
            QueryableEntry {
                id,
                key_expr: key_expr.as_owned(),
                complete: self.complete,
                queue,
            },
        );
        session.register_task(id, task);
        tracing::trace!("declared queryable {} on {}", id, key_expr);
        Ok(Queryable {
            inner: QueryableInner {
                session,
                id,
                key_expr,
                undeclare_on_drop: self.undeclare_on_drop,
            },
            handler: receiver,
        })
    }
}

impl<Handler> IntoFuture for QueryableBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Query>,
    Handler::Handler: Send,
{
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}
