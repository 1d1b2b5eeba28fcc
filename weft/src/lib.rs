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

//! An in-process publish/subscribe and query fabric with key-expression
//! routing.
//!
//! Sessions opened in the same process rendezvous through a shared fabric:
//! publications are routed to every subscriber whose key expression
//! intersects the published key, queries are answered by the matching
//! queryables, liveliness tokens let sessions observe each other's presence
//! and scouting discovers the sessions themselves.
//!
//! # Examples
//!
//! Publish a key/value pair:
//! ```
//! # #[tokio::main]
//! # async fn main() {
//! let session = weft::open(weft::Config::default()).await.unwrap();
//! session.put("key/expression", "value").await.unwrap();
//! session.close().await.unwrap();
//! # }
//! ```
//!
//! Subscribe:
//! ```no_run
//! # #[tokio::main]
//! # async fn main() {
//! let session = weft::open(weft::Config::default()).await.unwrap();
//! let subscriber = session.declare_subscriber("key/expression").await.unwrap();
//! while let Ok(sample) = subscriber.recv_async().await {
//!     println!(">> received {:?}", sample.payload());
//! }
//! # }
//! ```
//!
//! Query:
//! ```
//! # #[tokio::main]
//! # async fn main() {
//! let session = weft::open(weft::Config::default()).await.unwrap();
//! let replies = session.get("key/expression").await.unwrap();
//! while let Ok(reply) = replies.recv_async().await {
//!     println!(">> {:?}", reply.result());
//! }
//! # }
//! ```
pub(crate) mod api;
pub(crate) mod net;

/// The error type returned by weft operations. Concrete error kinds can be
/// recovered with [`downcast_ref`](std::error::Error).
pub use weft_result::Error;
/// The result type returned by weft operations.
pub use weft_result::WResult as Result;

pub use crate::api::{
    scouting::scout,
    session::{open, Session},
};

/// Initializes the tracing subscriber from the `RUST_LOG` environment
/// variable, falling back to the given level.
pub use weft_core::log::init_log_from_env_or;
pub use weft_core::{Resolvable, Resolve, Wait};
pub use weft_config::Config;

/// Configuration of a weft [`Session`].
pub mod config {
    pub use weft_config::{
        client, default, peer, router, Config, EndPoint, ScoutingConf, WhatAmI, WhatAmIMatcher,
    };
}

/// Key expressions, the addressing primitive of weft.
pub mod key_expr {
    pub use weft_keyexpr::{keyexpr, OwnedKeyExpr, SINGLE_WILD, DOUBLE_WILD};

    pub use crate::api::key_expr::KeyExpr;
}

/// Payloads and their encodings.
pub mod bytes {
    pub use crate::api::{encoding::Encoding, payload::Payload};
}

/// Quality of service primitives.
pub mod qos {
    pub use crate::api::qos::{CongestionControl, Priority, Reliability};
}

/// Samples, the data unit received by subscribers.
pub mod sample {
    pub use crate::api::sample::{Sample, SampleKind};
}

/// Timestamping, through each session's hybrid logical clock.
pub mod time {
    pub use crate::api::sample::Timestamp;
}

/// Callback and channel handlers for samples, queries, replies and hellos.
pub mod handlers {
    pub use crate::api::handlers::{
        locked, Callback, CallbackDrop, DefaultHandler, FifoChannel, FifoChannelHandler,
        IntoHandler, RingChannel, RingChannelHandler,
    };
}

/// Publishing, both through [`Session::put`](crate::Session::put) and
/// through declared [`Publisher`](crate::pubsub::Publisher)s.
pub mod pubsub {
    pub use crate::api::{
        builders::publication::{
            PublicationBuilder, PublicationBuilderDelete, PublicationBuilderPut, PublisherBuilder,
        },
        publisher::Publisher,
        subscriber::{Subscriber, SubscriberBuilder},
    };
}

/// Querying, both through [`Session::get`](crate::Session::get) and through
/// declared [`Querier`](crate::query::Querier)s.
pub mod query {
    pub use crate::api::{
        querier::{Querier, QuerierBuilder, QuerierGetBuilder},
        query::{
            ConsolidationMode, QueryConsolidation, QueryTarget, Reply, ReplyError,
            SessionGetBuilder,
        },
        queryable::{
            Query, Queryable, QueryableBuilder, ReplyBuilder, ReplyBuilderDelete, ReplyBuilderPut,
            ReplyErrBuilder,
        },
        selector::{Parameters, Selector},
    };
}

/// Scouting, the discovery of other sessions.
pub mod scouting {
    pub use crate::api::scouting::{Hello, Scout, ScoutBuilder};
}

/// Liveliness tokens and their observation.
pub mod liveliness {
    pub use crate::api::liveliness::{
        Liveliness, LivelinessGetBuilder, LivelinessSubscriberBuilder, LivelinessToken,
        LivelinessTokenBuilder,
    };
}

/// Session introspection.
pub mod session {
    pub use crate::api::{
        builders::session::OpenBuilder,
        info::{SessionInfo, WeftId},
    };
}

/// The concrete error types weft operations can return, recoverable from a
/// [`crate::Error`] with `downcast_ref`.
pub mod error {
    pub use weft_keyexpr::InvalidKeyExpr;

    pub use crate::api::error::{ClosedResourceError, ConnectionError, PublishError};
}

/// A prelude to glob-import for the commonly used traits.
pub mod prelude {
    pub use weft_core::{Resolvable, Resolve, Wait};

    pub use crate::api::handlers::IntoHandler;
}
