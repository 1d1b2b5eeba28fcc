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

//! Sample primitives.
use core::fmt;

pub use uhlc::Timestamp;

use crate::api::{
    encoding::Encoding,
    key_expr::KeyExpr,
    payload::Payload,
    qos::{CongestionControl, Priority},
};

/// The kind of a `Sample`, i.e. whether it is a data update or a deletion
/// notification.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum SampleKind {
    /// The Sample was issued by a `put` operation.
    #[default]
    Put = 0,
    /// The Sample was issued by a `delete` operation.
    Delete = 1,
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::Put => write!(f, "PUT"),
            SampleKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// The value delivered to subscribers for each publication matching their key
/// expression: the concrete key, the payload and its metadata.
#[derive(Debug, Clone)]
pub struct Sample {
    pub(crate) key_expr: KeyExpr<'static>,
    pub(crate) payload: Payload,
    pub(crate) kind: SampleKind,
    pub(crate) encoding: Encoding,
    pub(crate) timestamp: Option<Timestamp>,
    pub(crate) priority: Priority,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) attachment: Option<Payload>,
}

impl Sample {
    /// Gets the key expression on which this Sample was published.
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        &self.key_expr
    }

    /// Gets the payload of this Sample.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Gets the kind of this Sample.
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Gets the encoding of this sample.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Gets the timestamp of this Sample, if any.
    ///
    /// Samples emitted by `put`/`delete` are always timestamped by the
    /// publishing session's hybrid logical clock; the timestamps are
    /// comparable across the sessions of a process.
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    /// Gets the priority this Sample was published with.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Gets the congestion control this Sample was published with.
    pub fn congestion_control(&self) -> CongestionControl {
        self.congestion_control
    }

    /// Gets the sample attachment: a map of key-value pairs, where each key
    /// and value are byte-slices.
    pub fn attachment(&self) -> Option<&Payload> {
        self.attachment.as_ref()
    }
}
