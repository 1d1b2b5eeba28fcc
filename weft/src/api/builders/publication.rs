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
use std::future::{IntoFuture, Ready};

use weft_core::{Resolvable, Wait};
use weft_result::WResult;

use crate::api::{
    encoding::Encoding,
    error::PublishError,
    key_expr::KeyExpr,
    payload::Payload,
    publisher::Publisher,
    qos::{CongestionControl, Priority, Reliability},
    sample::{SampleKind, Timestamp},
    session::Session,
};

/// A builder for initializing a [`Publisher`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct PublisherBuilder<'a, 'b> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: WResult<KeyExpr<'b>>,
    pub(crate) encoding: Encoding,
    pub(crate) congestion_control: CongestionControl,
    pub(crate) priority: Priority,
    pub(crate) reliability: Reliability,
}

impl<'b> PublisherBuilder<'_, 'b> {
    /// Sets the default encoding of the published payloads.
    pub fn encoding<T: Into<Encoding>>(mut self, encoding: T) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Changes the [`CongestionControl`] to apply when routing the
    /// publications.
    pub fn congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.congestion_control = congestion_control;
        self
    }

    /// Changes the [`Priority`] of the publications.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Changes the advertised [`Reliability`] of the publications.
    pub fn reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = reliability;
        self
    }
}

impl<'b> Resolvable for PublisherBuilder<'_, 'b> {
    type To = WResult<Publisher<'b>>;
}

impl Wait for PublisherBuilder<'_, '_> {
    fn wait(self) -> Self::To {
        let session = self.session.downgrade();
        session.check_open("session")?;
        let key_expr = self.key_expr?;
        if key_expr.is_wild() {
            return Err(PublishError::new(format!(
                "cannot declare a publisher on the wild key expression {}",
                key_expr
            ))
            .into());
        }
        Ok(Publisher {
            session,
            key_expr,
            encoding: self.encoding,
            congestion_control: self.congestion_control,
            priority: self.priority,
            reliability: self.reliability,
        })
    }
}

impl IntoFuture for PublisherBuilder<'_, '_> {
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

/// The data of a put publication.
#[derive(Debug, Clone)]
pub struct PublicationBuilderPut {
    pub(crate) payload: Payload,
    pub(crate) encoding: Encoding,
}

/// The marker of a delete publication.
#[derive(Debug, Clone, Copy)]
pub struct PublicationBuilderDelete;

/// A builder for a put or delete publication, either directly on a session
/// (`P` is then an implicit [`PublisherBuilder`]) or through a declared
/// [`Publisher`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct PublicationBuilder<P, T> {
    pub(crate) publisher: P,
    pub(crate) kind: T,
    pub(crate) timestamp: Option<Timestamp>,
    pub(crate) attachment: Option<Payload>,
}

impl<P, T> PublicationBuilder<P, T> {
    /// Sets an explicit timestamp, overriding the publishing session's
    /// clock.
    pub fn timestamp<TS: Into<Option<Timestamp>>>(mut self, timestamp: TS) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Attaches user-provided bytes to the publication, carried to the
    /// subscribers next to the payload.
    pub fn attachment<A: Into<Payload>>(mut self, attachment: A) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

impl<P> PublicationBuilder<P, PublicationBuilderPut> {
    /// Sets the encoding of the published payload.
    pub fn encoding<T: Into<Encoding>>(mut self, encoding: T) -> Self {
        self.kind.encoding = encoding.into();
        self
    }
}

impl<T> PublicationBuilder<PublisherBuilder<'_, '_>, T> {
    /// Changes the [`CongestionControl`] to apply when routing this
    /// publication.
    pub fn congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.publisher = self.publisher.congestion_control(congestion_control);
        self
    }

    /// Changes the [`Priority`] of this publication.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.publisher = self.publisher.priority(priority);
        self
    }
}

impl<P, T> Resolvable for PublicationBuilder<P, T> {
    type To = WResult<()>;
}

impl Wait for PublicationBuilder<PublisherBuilder<'_, '_>, PublicationBuilderPut> {
    fn wait(self) -> Self::To {
        let session = self.publisher.session.downgrade();
        let key_expr = self.publisher.key_expr?;
        session.resolve_put(
            &key_expr,
            self.kind.payload,
            SampleKind::Put,
            self.kind.encoding,
            self.publisher.priority,
            self.publisher.congestion_control,
            self.timestamp,
            self.attachment,
        )
    }
}

impl Wait for PublicationBuilder<PublisherBuilder<'_, '_>, PublicationBuilderDelete> {
    fn wait(self) -> Self::To {
        let session = self.publisher.session.downgrade();
        let key_expr = self.publisher.key_expr?;
        session.resolve_put(
            &key_expr,
            Payload::empty(),
            SampleKind::Delete,
            Encoding::default(),
            self.publisher.priority,
            self.publisher.congestion_control,
            self.timestamp,
            self.attachment,
        )
    }
}

impl Wait for PublicationBuilder<&Publisher<'_>, PublicationBuilderPut> {
    fn wait(self) -> Self::To {
        self.publisher.session.resolve_put(
            &self.publisher.key_expr,
            self.kind.payload,
            SampleKind::Put,
            self.kind.encoding,
            self.publisher.priority,
            self.publisher.congestion_control,
            self.timestamp,
            self.attachment,
        )
    }
}

impl Wait for PublicationBuilder<&Publisher<'_>, PublicationBuilderDelete> {
    fn wait(self) -> Self::To {
        self.publisher.session.resolve_put(
            &self.publisher.key_expr,
            Payload::empty(),
            SampleKind::Delete,
            Encoding::default(),
            self.publisher.priority,
            self.publisher.congestion_control,
            self.timestamp,
            self.attachment,
        )
    }
}

impl<P, T> IntoFuture for PublicationBuilder<P, T>
where
    Self: Wait + Resolvable<To = WResult<()>>,
{
    type Output = WResult<()>;
    type IntoFuture = Ready<WResult<()>>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}
