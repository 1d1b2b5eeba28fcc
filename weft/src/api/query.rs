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
    sync::Arc,
    time::Duration,
};

use weft_core::{Resolvable, Wait};
use weft_result::WResult;

use crate::api::{
    encoding::Encoding,
    handlers::{Callback, IntoHandler},
    info::WeftId,
    payload::Payload,
    qos::{CongestionControl, Priority},
    sample::Sample,
    selector::Selector,
    session::Session,
};

/// An error reply sent through [`Query::reply_err`](crate::query::Query::reply_err).
#[derive(Clone)]
pub struct ReplyError {
    pub(crate) payload: Payload,
    pub(crate) encoding: Encoding,
}

impl ReplyError {
    /// The error payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The encoding of the error payload.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }
}

impl fmt::Debug for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyError")
            .field("payload", &self.payload)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload.try_to_string() {
            Ok(s) => write!(f, "query returned an error: {}", s),
            Err(_) => write!(f, "query returned an error ({} bytes)", self.payload.len()),
        }
    }
}

impl std::error::Error for ReplyError {}

/// A reply to a query, carrying either a [`Sample`] or a [`ReplyError`].
#[derive(Debug, Clone)]
pub struct Reply {
    pub(crate) result: Result<Sample, ReplyError>,
    pub(crate) replier_id: Option<WeftId>,
}

impl Reply {
    /// The result of this reply.
    pub fn result(&self) -> Result<&Sample, &ReplyError> {
        self.result.as_ref()
    }

    /// Converts this reply into its result.
    pub fn into_result(self) -> Result<Sample, ReplyError> {
        self.result
    }

    /// A shorthand for `self.result().ok()`.
    pub fn ok(&self) -> Option<&Sample> {
        self.result.as_ref().ok()
    }

    /// The id of the session that produced this reply, when known.
    pub fn replier_id(&self) -> Option<WeftId> {
        self.replier_id
    }
}

impl From<Reply> for Result<Sample, ReplyError> {
    fn from(reply: Reply) -> Self {
        reply.result
    }
}

/// The kind of consolidation to apply to the replies of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsolidationMode {
    /// Let the session pick: [`Latest`](ConsolidationMode::Latest) unless
    /// overridden.
    #[default]
    Auto,
    /// No consolidation: every reply is delivered as it arrives.
    None,
    /// Deliver a reply only if its timestamp is more recent than that of any
    /// reply already delivered for the same key.
    Monotonic,
    /// Deliver only the most recent reply per key, once the response is
    /// complete.
    Latest,
}

/// The consolidation strategy to apply to the replies of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryConsolidation {
    mode: ConsolidationMode,
}

impl QueryConsolidation {
    pub const DEFAULT: Self = Self {
        mode: ConsolidationMode::Auto,
    };

    /// Automatic consolidation strategy selection.
    pub const AUTO: Self = Self {
        mode: ConsolidationMode::Auto,
    };

    pub(crate) fn mode(&self) -> ConsolidationMode {
        self.mode
    }
}

impl From<ConsolidationMode> for QueryConsolidation {
    fn from(mode: ConsolidationMode) -> Self {
        Self { mode }
    }
}

/// The queryables a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryTarget {
    /// Target the first complete queryable if one exists, otherwise all
    /// matching queryables.
    #[default]
    BestMatching,
    /// Target every matching queryable.
    All,
    /// Target every matching queryable advertised as complete.
    AllComplete,
}

/// A builder returned by [`Session::get`](crate::Session::get).
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct SessionGetBuilder<'a, 'b, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) selector: WResult<Selector<'b>>,
    pub(crate) target: QueryTarget,
    pub(crate) consolidation: QueryConsolidation,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) priority: Priority,
    pub(crate) timeout: Duration,
    pub(crate) payload: Option<Payload>,
    pub(crate) encoding: Option<Encoding>,
    pub(crate) attachment: Option<Payload>,
    pub(crate) handler: Handler,
}

impl<'a, 'b, Handler> SessionGetBuilder<'a, 'b, Handler> {
    /// Receive the replies for this query with a callback.
    pub fn callback<F>(self, callback: F) -> SessionGetBuilder<'a, 'b, Callback<Reply>>
    where
        F: Fn(Reply) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the replies for this query with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> SessionGetBuilder<'a, 'b, Callback<Reply>>
    where
        F: FnMut(Reply) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the replies for this query with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> SessionGetBuilder<'a, 'b, H>
    where
        H: IntoHandler<Reply>,
    {
        SessionGetBuilder {
            session: self.session,
            selector: self.selector,
            target: self.target,
            consolidation: self.consolidation,
            congestion_control: self.congestion_control,
            priority: self.priority,
            timeout: self.timeout,
            payload: self.payload,
            encoding: self.encoding,
            attachment: self.attachment,
            handler,
        }
    }

    /// Changes the [`QueryTarget`] of the query.
    pub fn target(mut self, target: QueryTarget) -> Self {
        self.target = target;
        self
    }

    /// Changes the [`QueryConsolidation`] to apply to the replies.
    pub fn consolidation<QC: Into<QueryConsolidation>>(mut self, consolidation: QC) -> Self {
        self.consolidation = consolidation.into();
        self
    }

    /// Changes the [`CongestionControl`] of the query: whether it blocks or
    /// is dropped for a queryable whose queue is full.
    pub fn congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.congestion_control = congestion_control;
        self
    }

    /// Changes the [`Priority`] of the query. Replies inherit it unless the
    /// replier sets their own.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the query timeout: the response is cut off at the deadline even
    /// if some queryables have not finalized their replies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
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

impl<Handler> Resolvable for SessionGetBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    type To = WResult<Handler::Handler>;
}

impl<Handler> Wait for SessionGetBuilder<'_, '_, Handler>
where
    Handler: IntoHandler<Reply>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        let selector = self.selector?;
        let (callback, receiver) = self.handler.into_handler();
        session.query(
            selector,
            self.target,
            self.consolidation,
            self.congestion_control,
            self.priority,
            self.timeout,
            self.payload,
            self.encoding,
            self.attachment,
            callback,
        )?;
        Ok(receiver)
    }
}

impl<Handler> IntoFuture for SessionGetBuilder<'_, '_, Handler>
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
