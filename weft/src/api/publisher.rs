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
use weft_core::{Resolve, ResolveClosure};
use weft_result::WResult;

use crate::api::{
    builders::publication::{PublicationBuilder, PublicationBuilderDelete, PublicationBuilderPut},
    encoding::Encoding,
    key_expr::KeyExpr,
    payload::Payload,
    qos::{CongestionControl, Priority, Reliability},
    session::WeakSession,
};

/// A publisher bound to a fixed, non-wild key expression.
///
/// Publishers allow publishing repeatedly on the same key with pre-set
/// QoS and encoding, without re-validating the key on every publication.
///
/// # Examples
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let publisher = session.declare_publisher("key/expression").await.unwrap();
/// publisher.put("value").await.unwrap();
/// # }
/// ```
pub struct Publisher<'a> {
    pub(crate) session: WeakSession,
    pub(crate) key_expr: KeyExpr<'a>,
    pub(crate) encoding: Encoding,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) priority: Priority,
    pub(crate) reliability: Reliability,
}

impl<'a> Publisher<'a> {
    /// Returns the key expression of this publisher.
    pub fn key_expr(&self) -> &KeyExpr<'a> {
        &self.key_expr
    }

    /// Gets the default encoding of the published payloads.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Gets the congestion control applied when routing this publisher's
    /// publications.
    pub fn congestion_control(&self) -> CongestionControl {
        self.congestion_control
    }

    /// Gets the priority of this publisher's publications.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Gets the reliability this publisher advertises.
    pub fn reliability(&self) -> Reliability {
        self.reliability
    }

    /// Puts a payload on the key expression of this publisher.
    pub fn put<IntoPayload>(
        &self,
        payload: IntoPayload,
    ) -> PublicationBuilder<&Publisher<'a>, PublicationBuilderPut>
    where
        IntoPayload: Into<Payload>,
    {
        PublicationBuilder {
            publisher: self,
            kind: PublicationBuilderPut {
                payload: payload.into(),
                encoding: self.encoding.clone(),
            },
            timestamp: None,
            attachment: None,
        }
    }

    /// Notifies subscribers that the resource at the key expression of this
    /// publisher no longer exists.
    pub fn delete(&self) -> PublicationBuilder<&Publisher<'a>, PublicationBuilderDelete> {
        PublicationBuilder {
            publisher: self,
            kind: PublicationBuilderDelete,
            timestamp: None,
            attachment: None,
        }
    }

    /// Undeclares this publisher.
    ///
    /// Publishers keep no fabric-side state, so this only consumes the
    /// handle; it is provided for symmetry with the other entities.
    pub fn undeclare(self) -> impl Resolve<WResult<()>> + 'a {
        ResolveClosure::new(move || {
            drop(self);
            Ok(())
        })
    }
}

impl core::fmt::Debug for Publisher<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Publisher")
            .field("key_expr", &self.key_expr)
            .finish_non_exhaustive()
    }
}
