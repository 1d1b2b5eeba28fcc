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
    collections::HashMap,
    convert::TryInto,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::time::Instant;
use uhlc::{HLCBuilder, HLC};
use weft_config::{Config, EndPoint, WhatAmI};
use weft_core::{wconfigurable, wlock, wwrite, Resolve, ResolveClosure};
use weft_keyexpr::OwnedKeyExpr;
use weft_result::WResult;
use weft_runtime::{TerminatableTask, WRuntime};

use crate::{
    api::{
        builders::{
            publication::{
                PublicationBuilder, PublicationBuilderDelete, PublicationBuilderPut,
                PublisherBuilder,
            },
            session::OpenBuilder,
        },
        encoding::Encoding,
        error::{ClosedResourceError, ConnectionError, PublishError},
        handlers::{Callback, DefaultHandler},
        info::{SessionInfo, WeftId},
        key_expr::KeyExpr,
        liveliness::Liveliness,
        payload::Payload,
        qos::{CongestionControl, Priority, Reliability},
        querier::QuerierBuilder,
        query::{ConsolidationMode, QueryConsolidation, QueryTarget, Reply, SessionGetBuilder},
        queryable::{Query, QueryInner, QueryableBuilder},
        sample::{Sample, SampleKind, Timestamp},
        selector::Selector,
        subscriber::SubscriberBuilder,
        Id,
    },
    net::fabric::{fabric, token_sample, Node, NodeTables},
};

wconfigurable! {
    /// The capacity of each entity's delivery queue.
    pub(crate) static ref API_DATA_RECEPTION_CHANNEL_SIZE: usize = 256;
    /// The capacity of each queryable's query queue.
    pub(crate) static ref API_QUERY_RECEPTION_CHANNEL_SIZE: usize = 256;
    /// The default timeout of a query, in milliseconds.
    pub(crate) static ref API_QUERY_TIMEOUT_MS: u64 = 10_000;
    /// How long a closing session waits for its delivery workers to drain,
    /// in milliseconds.
    pub(crate) static ref API_CLOSE_GRACE_MS: u64 = 10_000;
}

pub(crate) struct SessionInner {
    pub(crate) node: Arc<Node>,
    pub(crate) hlc: HLC,
    closed: AtomicBool,
    next_id: AtomicU32,
    /// The delivery workers of this session's entities, keyed by entity id.
    /// Owned by the session so background entities outlive their handles.
    tasks: Mutex<HashMap<Id, TerminatableTask>>,
}

/// A handle on a session's internals that does not take part in the
/// close-on-last-drop accounting, for entities to refer back to their
/// session.
#[derive(Clone)]
pub(crate) struct WeakSession(pub(crate) Arc<SessionInner>);

impl Deref for WeakSession {
    type Target = SessionInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct SessionOwner(WeakSession);

impl Drop for SessionOwner {
    fn drop(&mut self) {
        if let Err(e) = self.0.close_inner() {
            tracing::error!("error closing session {}: {}", self.0.id(), e);
        }
    }
}

/// A weft session, the entry point to the fabric.
///
/// Sessions are cheaply cloneable and shareable across tasks. A session is
/// closed explicitly with [`Session::close`], or implicitly when its last
/// clone is dropped; either way every entity it declared is undeclared and
/// every pending operation on it fails with
/// [`ClosedResourceError`](crate::error::ClosedResourceError).
///
/// # Examples
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// session.put("key/expression", "value").await.unwrap();
/// session.close().await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct Session(Arc<SessionOwner>);

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(config: Config) -> WResult<Session> {
        if config.mode == WhatAmI::Client
            && !fabric()
                .nodes()
                .iter()
                .any(|n| n.whatami == WhatAmI::Router)
        {
            return Err(ConnectionError::new("no router is reachable for this client").into());
        }
        let id = WeftId::rand();
        let mut locators = config.listen.endpoints.clone();
        if locators.is_empty() {
            // Every node is reachable in-process; synthesize a locator so
            // scouting always reports at least one.
            let endpoint: EndPoint = format!("mem/{id}").parse()?;
            locators.push(endpoint);
        }
        let hlc = HLCBuilder::new().with_id(id.to_hlc_id()).build();
        let node = Arc::new(Node {
            id,
            whatami: config.mode,
            locators,
            discoverable: config.scouting.multicast.enabled,
            tables: std::sync::RwLock::new(NodeTables::default()),
        });
        fabric().register_node(node.clone());
        tracing::debug!("opened session {} in {} mode", id, config.mode);
        Ok(Session(Arc::new(SessionOwner(WeakSession(Arc::new(
            SessionInner {
                node,
                hlc,
                closed: AtomicBool::new(false),
                next_id: AtomicU32::new(1),
                tasks: Mutex::new(HashMap::new()),
            },
        ))))))
    }

    pub(crate) fn downgrade(&self) -> WeakSession {
        self.0 .0.clone()
    }

    /// Returns the unique [`WeftId`] of this session.
    pub fn id(&self) -> WeftId {
        self.0 .0.id()
    }

    /// Returns `true` once this session (or any clone of it) has been
    /// closed.
    pub fn is_closed(&self) -> bool {
        self.0 .0.is_closed()
    }

    /// Closes the session, undeclaring all its entities.
    ///
    /// Delivery workers are drained before their handlers are released.
    /// Closing an already closed session is a no-op.
    pub fn close(&self) -> impl Resolve<WResult<()>> + '_ {
        ResolveClosure::new(move || self.0 .0.close_inner())
    }

    /// Gives access to information about this session and the fabric it is
    /// part of.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session: self.downgrade(),
        }
    }

    /// Generates a [`Timestamp`] from this session's hybrid logical clock.
    pub fn new_timestamp(&self) -> Timestamp {
        self.0 .0.hlc.new_timestamp()
    }

    /// Gives access to the liveliness primitives of this session.
    pub fn liveliness(&self) -> Liveliness<'_> {
        Liveliness { session: self }
    }

    /// Puts a payload on the given non-wild key expression.
    ///
    /// # Examples
    /// ```
    /// # #[tokio::main]
    /// # async fn main() {
    /// let session = weft::open(weft::Config::default()).await.unwrap();
    /// session
    ///     .put("key/expression", "payload")
    ///     .encoding(weft::bytes::Encoding::TEXT_PLAIN)
    ///     .await
    ///     .unwrap();
    /// # }
    /// ```
    pub fn put<'a, 'b: 'a, TryIntoKeyExpr, IntoPayload>(
        &'a self,
        key_expr: TryIntoKeyExpr,
        payload: IntoPayload,
    ) -> PublicationBuilder<PublisherBuilder<'a, 'b>, PublicationBuilderPut>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
        IntoPayload: Into<Payload>,
    {
        PublicationBuilder {
            publisher: self.declare_publisher(key_expr),
            kind: PublicationBuilderPut {
                payload: payload.into(),
                encoding: Encoding::default(),
            },
            timestamp: None,
            attachment: None,
        }
    }

    /// Notifies subscribers that the resource at the given key expression no
    /// longer exists.
    pub fn delete<'a, 'b: 'a, TryIntoKeyExpr>(
        &'a self,
        key_expr: TryIntoKeyExpr,
    ) -> PublicationBuilder<PublisherBuilder<'a, 'b>, PublicationBuilderDelete>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        PublicationBuilder {
            publisher: self.declare_publisher(key_expr),
            kind: PublicationBuilderDelete,
            timestamp: None,
            attachment: None,
        }
    }

    /// Queries the queryables matching the given selector and returns their
    /// replies.
    ///
    /// # Examples
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() {
    /// let session = weft::open(weft::Config::default()).await.unwrap();
    /// let replies = session.get("key/expression?details=true").await.unwrap();
    /// while let Ok(reply) = replies.recv_async().await {
    ///     println!(">> {:?}", reply.result());
    /// }
    /// # }
    /// ```
    pub fn get<'a, 'b: 'a, TryIntoSelector>(
        &'a self,
        selector: TryIntoSelector,
    ) -> SessionGetBuilder<'a, 'b, DefaultHandler>
    where
        TryIntoSelector: TryInto<Selector<'b>>,
        <TryIntoSelector as TryInto<Selector<'b>>>::Error: Into<crate::Error>,
    {
        SessionGetBuilder {
            session: self,
            selector: selector.try_into().map_err(Into::into),
            target: QueryTarget::default(),
            consolidation: QueryConsolidation::default(),
            congestion_control: CongestionControl::Block,
            priority: Priority::DEFAULT,
            timeout: Duration::from_millis(*API_QUERY_TIMEOUT_MS),
            payload: None,
            encoding: None,
            attachment: None,
            handler: DefaultHandler::default(),
        }
    }

    /// Declares a subscriber receiving every publication matching the given
    /// key expression.
    ///
    /// # Examples
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() {
    /// let session = weft::open(weft::Config::default()).await.unwrap();
    /// let subscriber = session.declare_subscriber("key/expression").await.unwrap();
    /// while let Ok(sample) = subscriber.recv_async().await {
    ///     println!(">> received {:?}", sample.payload());
    /// }
    /// # }
    /// ```
    pub fn declare_subscriber<'a, 'b: 'a, TryIntoKeyExpr>(
        &'a self,
        key_expr: TryIntoKeyExpr,
    ) -> SubscriberBuilder<'a, 'b, DefaultHandler>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        SubscriberBuilder {
            session: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            history: false,
            undeclare_on_drop: true,
            handler: DefaultHandler::default(),
        }
    }

    /// Declares a publisher bound to the given non-wild key expression, to
    /// publish repeatedly on it with pre-set QoS.
    pub fn declare_publisher<'a, 'b: 'a, TryIntoKeyExpr>(
        &'a self,
        key_expr: TryIntoKeyExpr,
    ) -> PublisherBuilder<'a, 'b>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        PublisherBuilder {
            session: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            encoding: Encoding::default(),
            congestion_control: CongestionControl::default(),
            priority: Priority::default(),
            reliability: Reliability::default(),
        }
    }

    /// Declares a queryable answering the queries whose selector matches the
    /// given key expression.
    pub fn declare_queryable<'a, 'b: 'a, TryIntoKeyExpr>(
        &'a self,
        key_expr: TryIntoKeyExpr,
    ) -> QueryableBuilder<'a, 'b, DefaultHandler>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        QueryableBuilder {
            session: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            complete: false,
            undeclare_on_drop: true,
            handler: DefaultHandler::default(),
        }
    }

    /// Declares a querier issuing queries on the given key expression with
    /// pre-set target, consolidation and timeout.
    pub fn declare_querier<'a, 'b: 'a, TryIntoKeyExpr>(
        &'a self,
        key_expr: TryIntoKeyExpr,
    ) -> QuerierBuilder<'a, 'b>
    where
        TryIntoKeyExpr: TryInto<KeyExpr<'b>>,
        <TryIntoKeyExpr as TryInto<KeyExpr<'b>>>::Error: Into<crate::Error>,
    {
        QuerierBuilder {
            session: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            target: QueryTarget::default(),
            consolidation: QueryConsolidation::default(),
            congestion_control: CongestionControl::Block,
            priority: Priority::DEFAULT,
            timeout: Duration::from_millis(*API_QUERY_TIMEOUT_MS),
        }
    }
}

impl SessionInner {
    pub(crate) fn id(&self) -> WeftId {
        self.node.id
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    pub(crate) fn check_open(&self, resource: &'static str) -> WResult<()> {
        if self.is_closed() {
            return Err(ClosedResourceError::new(resource).into());
        }
        Ok(())
    }

    pub(crate) fn next_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn register_task(&self, id: Id, task: TerminatableTask) {
        wlock!(self.tasks).insert(id, task);
    }

    /// Removes an entity's delivery worker; dropping it cancels the worker,
    /// which drains its queue and releases the handler asynchronously.
    pub(crate) fn unregister_task(&self, id: Id) {
        wlock!(self.tasks).remove(&id);
    }

    fn close_inner(&self) -> WResult<()> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        tracing::debug!("closing session {}", self.id());
        // Remaining liveliness tokens die with the session; announce it
        // while our own node is still registered.
        let tokens: Vec<OwnedKeyExpr> = {
            let mut tables = wwrite!(self.node.tables);
            tables.tokens.drain(..).map(|t| t.key_expr).collect()
        };
        for key_expr in tokens {
            fabric().route_liveliness(token_sample(key_expr, SampleKind::Delete, &self.hlc));
        }
        fabric().unregister_node(self.id());
        let tasks: Vec<TerminatableTask> = wlock!(self.tasks).drain().map(|(_, t)| t).collect();
        let grace = Duration::from_millis(*API_CLOSE_GRACE_MS);
        for task in tasks {
            task.terminate(grace);
        }
        Ok(())
    }

    /// Builds and routes a publication.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn resolve_put(
        &self,
        key_expr: &KeyExpr<'_>,
        payload: Payload,
        kind: SampleKind,
        encoding: Encoding,
        priority: Priority,
        congestion_control: CongestionControl,
        timestamp: Option<Timestamp>,
        attachment: Option<Payload>,
    ) -> WResult<()> {
        self.check_open("session")?;
        if key_expr.is_wild() {
            return Err(PublishError::new(format!(
                "cannot {} on the wild key expression {}",
                kind, key_expr
            ))
            .into());
        }
        let sample = Sample {
            key_expr: key_expr.clone().into_owned(),
            payload,
            kind,
            encoding,
            timestamp: Some(timestamp.unwrap_or_else(|| self.hlc.new_timestamp())),
            priority,
            congestion_control,
            attachment,
        };
        fabric().route_sample(sample);
        Ok(())
    }

    pub(crate) fn undeclare_subscriber_inner(&self, id: Id) -> WResult<()> {
        if self.is_closed() {
            // The session teardown already tore the entity down.
            return Ok(());
        }
        fabric().remove_subscriber(&self.node, id);
        self.unregister_task(id);
        tracing::trace!("undeclared subscriber {} of session {}", id, self.id());
        Ok(())
    }

    pub(crate) fn undeclare_queryable_inner(&self, id: Id) -> WResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        fabric().remove_queryable(&self.node, id);
        self.unregister_task(id);
        tracing::trace!("undeclared queryable {} of session {}", id, self.id());
        Ok(())
    }

    pub(crate) fn undeclare_token_inner(&self, id: Id) -> WResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        fabric().remove_token(&self.node, id, &self.hlc);
        tracing::trace!("undeclared liveliness token {} of session {}", id, self.id());
        Ok(())
    }
}

impl WeakSession {
    /// Dispatches a query to the matching queryables and spawns the reply
    /// forwarder applying consolidation and the timeout.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn query(
        &self,
        selector: Selector<'_>,
        target: QueryTarget,
        consolidation: QueryConsolidation,
        congestion_control: CongestionControl,
        priority: Priority,
        timeout: Duration,
        payload: Option<Payload>,
        encoding: Option<Encoding>,
        attachment: Option<Payload>,
        callback: Callback<Reply>,
    ) -> WResult<()> {
        self.check_open("session")?;
        let (reply_tx, reply_rx) = flume::unbounded::<Reply>();
        let targets = fabric().matching_queryables(&selector.key_expr, target);
        tracing::trace!(
            "query on {} dispatched to {} queryable(s)",
            selector,
            targets.len()
        );
        for (replier_id, queue) in targets {
            let query = Query {
                inner: Arc::new(QueryInner {
                    key_expr: selector.key_expr.clone().into_owned(),
                    parameters: selector.parameters.clone().into_owned(),
                    payload: payload.clone(),
                    encoding: encoding.clone(),
                    attachment: attachment.clone(),
                    priority,
                    replies: reply_tx.clone(),
                    replier_id,
                }),
            };
            match congestion_control {
                CongestionControl::Block => {
                    let _ = queue.send(query);
                }
                CongestionControl::Drop => {
                    if let Err(flume::TrySendError::Full(_)) = queue.try_send(query) {
                        tracing::trace!(
                            "query on {} dropped: a queryable's queue is full",
                            selector
                        );
                    }
                }
            }
        }
        // The forwarder terminates once every query clone is dropped.
        drop(reply_tx);
        let mode = match consolidation.mode() {
            ConsolidationMode::Auto => ConsolidationMode::Latest,
            mode => mode,
        };
        let session = self.clone();
        WRuntime::Net.spawn(reply_forwarder(session, reply_rx, mode, timeout, callback));
        Ok(())
    }
}

/// Forwards replies to the requester's callback, applying the consolidation
/// mode and cutting the response off at the deadline. Dropping the callback
/// at the end is what signals response completion to channel handlers.
async fn reply_forwarder(
    session: WeakSession,
    replies: flume::Receiver<Reply>,
    mode: ConsolidationMode,
    timeout: Duration,
    callback: Callback<Reply>,
) {
    let deadline = Instant::now() + timeout;
    let mut latest: HashMap<OwnedKeyExpr, Reply> = HashMap::new();
    let mut last_emitted: HashMap<OwnedKeyExpr, Timestamp> = HashMap::new();
    loop {
        let mut reply = tokio::select! {
            reply = replies.recv_async() => match reply {
                Ok(reply) => reply,
                Err(_) => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                tracing::trace!("query timed out, cutting the response off");
                break;
            }
        };
        match &mut reply.result {
            Err(_) => {
                // Error replies bypass consolidation.
                callback.call(reply);
            }
            Ok(sample) => {
                // Replies without a timestamp are stamped on reception so
                // consolidation can order them.
                let timestamp = match sample.timestamp {
                    Some(timestamp) => timestamp,
                    None => {
                        let timestamp = session.hlc.new_timestamp();
                        sample.timestamp = Some(timestamp);
                        timestamp
                    }
                };
                let key_expr = sample.key_expr.as_owned();
                match mode {
                    ConsolidationMode::None => callback.call(reply),
                    ConsolidationMode::Monotonic => {
                        if last_emitted
                            .get(&key_expr)
                            .map_or(true, |last| timestamp > *last)
                        {
                            last_emitted.insert(key_expr, timestamp);
                            callback.call(reply);
                        }
                    }
                    ConsolidationMode::Auto | ConsolidationMode::Latest => {
                        match latest.entry(key_expr) {
                            std::collections::hash_map::Entry::Occupied(mut entry) => {
                                let kept = entry
                                    .get()
                                    .result
                                    .as_ref()
                                    .ok()
                                    .and_then(|s| s.timestamp);
                                if kept.map_or(true, |kept| timestamp > kept) {
                                    entry.insert(reply);
                                }
                            }
                            std::collections::hash_map::Entry::Vacant(entry) => {
                                entry.insert(reply);
                            }
                        }
                    }
                }
            }
        }
    }
    // Flush the consolidated replies in a deterministic order.
    let mut buffered: Vec<(OwnedKeyExpr, Reply)> = latest.into_iter().collect();
    buffered.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
    for (_, reply) in buffered {
        callback.call(reply);
    }
}

/// Opens a weft [`Session`].
///
/// # Examples
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// # }
/// ```
pub fn open<TryIntoConfig>(config: TryIntoConfig) -> OpenBuilder
where
    TryIntoConfig: TryInto<Config>,
    <TryIntoConfig as TryInto<Config>>::Error: Into<crate::Error>,
{
    OpenBuilder {
        config: config.try_into().map_err(Into::into),
    }
}
