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

//! The process-global fabric all sessions rendezvous on.
//!
//! Opening a [`Session`](crate::Session) registers a [`Node`] here; routing a
//! publication or a query is a walk over the registered nodes' tables. No
//! wire is involved: "delivery" means enqueueing on the matching entities'
//! delivery queues.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, OnceLock, RwLock,
    },
};

use flume::TrySendError;
use uhlc::HLC;
use weft_config::{EndPoint, WhatAmI, WhatAmIMatcher};
use weft_core::{wlock, wread, wwrite};
use weft_keyexpr::{keyexpr, OwnedKeyExpr};

use crate::api::{
    encoding::Encoding,
    info::WeftId,
    key_expr::KeyExpr,
    payload::Payload,
    qos::{CongestionControl, Priority},
    query::QueryTarget,
    queryable::Query,
    sample::{Sample, SampleKind},
    scouting::Hello,
    subscriber::SubscriberKind,
    Id,
};

pub(crate) struct SubscriberEntry {
    pub(crate) id: Id,
    pub(crate) kind: SubscriberKind,
    pub(crate) key_expr: OwnedKeyExpr,
    pub(crate) queue: flume::Sender<Sample>,
}

pub(crate) struct QueryableEntry {
    pub(crate) id: Id,
    pub(crate) key_expr: OwnedKeyExpr,
    pub(crate) complete: bool,
    pub(crate) queue: flume::Sender<Query>,
}

pub(crate) struct TokenEntry {
    pub(crate) id: Id,
    pub(crate) key_expr: OwnedKeyExpr,
}

#[derive(Default)]
pub(crate) struct NodeTables {
    pub(crate) subscribers: Vec<SubscriberEntry>,
    pub(crate) queryables: Vec<QueryableEntry>,
    pub(crate) tokens: Vec<TokenEntry>,
}

/// One session's footprint on the fabric.
pub(crate) struct Node {
    pub(crate) id: WeftId,
    pub(crate) whatami: WhatAmI,
    pub(crate) locators: Vec<EndPoint>,
    /// Whether this node answers scouting probes.
    pub(crate) discoverable: bool,
    pub(crate) tables: RwLock<NodeTables>,
}

struct ScoutEntry {
    id: usize,
    what: WhatAmIMatcher,
    queue: flume::Sender<Hello>,
    seen: HashSet<WeftId>,
}

pub(crate) struct Fabric {
    nodes: RwLock<Vec<Arc<Node>>>,
    scouts: Mutex<Vec<ScoutEntry>>,
    next_scout_id: AtomicUsize,
    /// The last put per concrete key, served to subscribers declared with
    /// history.
    retained: Mutex<HashMap<OwnedKeyExpr, Sample>>,
    /// Serializes routing against subscriber registration, so that a history
    /// snapshot is enqueued strictly before any concurrent live publication.
    order: Mutex<()>,
}

pub(crate) fn fabric() -> &'static Fabric {
    static FABRIC: OnceLock<Fabric> = OnceLock::new();
    FABRIC.get_or_init(|| Fabric {
        nodes: RwLock::new(Vec::new()),
        scouts: Mutex::new(Vec::new()),
        next_scout_id: AtomicUsize::new(0),
        retained: Mutex::new(HashMap::new()),
        order: Mutex::new(()),
    })
}

impl Fabric {
    pub(crate) fn register_node(&self, node: Arc<Node>) {
        wwrite!(self.nodes).push(node.clone());
        if node.discoverable {
            let mut scouts = wlock!(self.scouts);
            for scout in scouts.iter_mut() {
                if scout.what.matches(node.whatami) && scout.seen.insert(node.id) {
                    let _ = scout.queue.send(Hello::new(&node));
                }
            }
        }
    }

    pub(crate) fn unregister_node(&self, id: WeftId) {
        wwrite!(self.nodes).retain(|n| n.id != id);
    }

    pub(crate) fn nodes(&self) -> Vec<Arc<Node>> {
        wread!(self.nodes).clone()
    }

    /// Routes a data-plane publication to every matching subscriber of every
    /// node, applying the publication's congestion control per receiver.
    ///
    /// The receiver set is snapshotted under the `order` mutex, but the
    /// sends happen after releasing it: a `Block` send may park until the
    /// receiver's delivery task drains, and that task must stay free to
    /// route publications of its own.
    pub(crate) fn route_sample(&self, sample: Sample) {
        let queues = {
            let _guard = wlock!(self.order);
            {
                let mut retained = wlock!(self.retained);
                match sample.kind() {
                    SampleKind::Put => {
                        retained.insert(sample.key_expr().as_owned(), sample.clone());
                    }
                    SampleKind::Delete => {
                        retained.remove(&sample.key_expr().as_owned());
                    }
                }
            }
            self.matching_queues(&sample, SubscriberKind::Subscriber)
        };
        for queue in queues {
            deliver(&queue, sample.clone());
        }
    }

    /// Routes a liveliness change to every matching liveliness subscriber.
    pub(crate) fn route_liveliness(&self, sample: Sample) {
        let queues = {
            let _guard = wlock!(self.order);
            self.matching_queues(&sample, SubscriberKind::LivelinessSubscriber)
        };
        for queue in queues {
            deliver(&queue, sample.clone());
        }
    }

    fn matching_queues(&self, sample: &Sample, kind: SubscriberKind) -> Vec<flume::Sender<Sample>> {
        let mut queues = Vec::new();
        for node in wread!(self.nodes).iter() {
            for sub in wread!(node.tables).subscribers.iter() {
                if sub.kind == kind && sub.key_expr.intersects(sample.key_expr()) {
                    queues.push(sub.queue.clone());
                }
            }
        }
        queues
    }

    /// Registers a subscriber, optionally enqueueing its history snapshot
    /// first: the retained puts for data subscribers, one synthetic put per
    /// live token for liveliness subscribers.
    pub(crate) fn add_subscriber(
        &self,
        node: &Node,
        entry: SubscriberEntry,
        history: bool,
        hlc: &HLC,
    ) {
        let _guard = wlock!(self.order);
        if history {
            match entry.kind {
                SubscriberKind::Subscriber => {
                    let mut snapshot: Vec<Sample> = wlock!(self.retained)
                        .values()
                        .filter(|s| entry.key_expr.intersects(s.key_expr()))
                        .cloned()
                        .collect();
                    snapshot.sort_by_key(|s| s.timestamp);
                    for sample in snapshot {
                        let _ = entry.queue.send(sample);
                    }
                }
                SubscriberKind::LivelinessSubscriber => {
                    for (_, key) in self.live_tokens_inner(&entry.key_expr) {
                        let _ = entry.queue.send(token_sample(key, SampleKind::Put, hlc));
                    }
                }
            }
        }
        wwrite!(node.tables).subscribers.push(entry);
    }

    pub(crate) fn remove_subscriber(&self, node: &Node, id: Id) {
        wwrite!(node.tables).subscribers.retain(|s| s.id != id);
    }

    pub(crate) fn add_queryable(&self, node: &Node, entry: QueryableEntry) {
        wwrite!(node.tables).queryables.push(entry);
    }

    pub(crate) fn remove_queryable(&self, node: &Node, id: Id) {
        wwrite!(node.tables).queryables.retain(|q| q.id != id);
    }

    /// Declares a liveliness token and announces it to the matching
    /// liveliness subscribers.
    pub(crate) fn add_token(&self, node: &Node, entry: TokenEntry, hlc: &HLC) {
        let (sample, queues) = {
            let _guard = wlock!(self.order);
            let sample = token_sample(entry.key_expr.clone(), SampleKind::Put, hlc);
            wwrite!(node.tables).tokens.push(entry);
            let queues = self.matching_queues(&sample, SubscriberKind::LivelinessSubscriber);
            (sample, queues)
        };
        for queue in queues {
            deliver(&queue, sample.clone());
        }
    }

    /// Undeclares a liveliness token and announces its disappearance. A no-op
    /// if the token is already gone.
    pub(crate) fn remove_token(&self, node: &Node, id: Id, hlc: &HLC) {
        let (sample, queues) = {
            let _guard = wlock!(self.order);
            let key_expr = {
                let mut tables = wwrite!(node.tables);
                match tables.tokens.iter().position(|t| t.id == id) {
                    Some(pos) => tables.tokens.remove(pos).key_expr,
                    None => return,
                }
            };
            let sample = token_sample(key_expr, SampleKind::Delete, hlc);
            let queues = self.matching_queues(&sample, SubscriberKind::LivelinessSubscriber);
            (sample, queues)
        };
        for queue in queues {
            deliver(&queue, sample.clone());
        }
    }

    /// The currently live tokens matching `pattern`, with the node that
    /// declared each of them.
    pub(crate) fn live_tokens(&self, pattern: &keyexpr) -> Vec<(WeftId, OwnedKeyExpr)> {
        let _guard = wlock!(self.order);
        self.live_tokens_inner(pattern)
    }

    fn live_tokens_inner(&self, pattern: &keyexpr) -> Vec<(WeftId, OwnedKeyExpr)> {
        let mut out = Vec::new();
        for node in wread!(self.nodes).iter() {
            for token in wread!(node.tables).tokens.iter() {
                if pattern.intersects(&token.key_expr) {
                    out.push((node.id, token.key_expr.clone()));
                }
            }
        }
        out
    }

    /// The queryables a query on `key_expr` must be dispatched to.
    ///
    /// `BestMatching` narrows the set to a single complete queryable when one
    /// exists, otherwise falls back to all of them.
    pub(crate) fn matching_queryables(
        &self,
        key_expr: &keyexpr,
        target: QueryTarget,
    ) -> Vec<(WeftId, flume::Sender<Query>)> {
        let mut out = Vec::new();
        let mut complete = None;
        for node in wread!(self.nodes).iter() {
            for queryable in wread!(node.tables).queryables.iter() {
                if !queryable.key_expr.intersects(key_expr) {
                    continue;
                }
                if target == QueryTarget::AllComplete && !queryable.complete {
                    continue;
                }
                if queryable.complete && complete.is_none() {
                    complete = Some((node.id, queryable.queue.clone()));
                }
                out.push((node.id, queryable.queue.clone()));
            }
        }
        if target == QueryTarget::BestMatching {
            if let Some(complete) = complete {
                return vec![complete];
            }
        }
        out
    }

    /// Registers a scout and immediately hands it a hello for every
    /// discoverable node already present.
    pub(crate) fn add_scout(&self, what: WhatAmIMatcher, queue: flume::Sender<Hello>) -> usize {
        let id = self.next_scout_id.fetch_add(1, Ordering::Relaxed);
        let mut entry = ScoutEntry {
            id,
            what,
            queue,
            seen: HashSet::new(),
        };
        let mut scouts = wlock!(self.scouts);
        for node in self.nodes() {
            if node.discoverable && what.matches(node.whatami) && entry.seen.insert(node.id) {
                let _ = entry.queue.send(Hello::new(&node));
            }
        }
        scouts.push(entry);
        id
    }

    pub(crate) fn remove_scout(&self, id: usize) {
        wlock!(self.scouts).retain(|s| s.id != id);
    }
}

fn deliver(queue: &flume::Sender<Sample>, sample: Sample) {
    match sample.congestion_control() {
        CongestionControl::Block => {
            // A disconnect here means the subscriber is being torn down.
            let _ = queue.send(sample);
        }
        CongestionControl::Drop => match queue.try_send(sample) {
            Ok(()) => {}
            Err(TrySendError::Full(sample)) => {
                tracing::trace!("dropping sample for {} (congested receiver)", sample.key_expr());
            }
            Err(TrySendError::Disconnected(_)) => {}
        },
    }
}

/// The synthetic sample describing a liveliness token's (dis)appearance.
pub(crate) fn token_sample(key_expr: OwnedKeyExpr, kind: SampleKind, hlc: &HLC) -> Sample {
    Sample {
        key_expr: KeyExpr::from(key_expr),
        payload: Payload::empty(),
        kind,
        encoding: Encoding::default(),
        timestamp: Some(hlc.new_timestamp()),
        priority: Priority::DEFAULT,
        // Liveliness changes must never be lost to congestion.
        congestion_control: CongestionControl::Block,
        attachment: None,
    }
}
