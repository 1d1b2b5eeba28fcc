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
use core::fmt;

/// The error raised when an operation is attempted on an already closed
/// resource: a closed [`Session`](crate::Session), or an entity whose session
/// has been closed under it.
///
/// Downcast [`crate::Error`] to this type to tell teardown races apart from
/// real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedResourceError {
    resource: &'static str,
}

impl ClosedResourceError {
    pub(crate) fn new(resource: &'static str) -> Self {
        ClosedResourceError { resource }
    }
}

impl fmt::Display for ClosedResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempted to use a closed {}", self.resource)
    }
}

impl std::error::Error for ClosedResourceError {}

/// The error raised by [`open`](crate::open) when a session cannot be
/// established, either because the configuration is invalid or because a
/// client could not find a router to attach to.
#[derive(Debug)]
pub struct ConnectionError {
    reason: String,
    source: Option<crate::Error>,
}

impl ConnectionError {
    pub(crate) fn new<S: Into<String>>(reason: S) -> Self {
        ConnectionError {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn with_source<S: Into<String>>(reason: S, source: crate::Error) -> Self {
        ConnectionError {
            reason: reason.into(),
            source: Some(source),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "failed to open session: {}: {}", self.reason, source),
            None => write!(f, "failed to open session: {}", self.reason),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// The error raised when a publication is rejected before reaching the
/// fabric, typically because its target key expression is wild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError {
    reason: String,
}

impl PublishError {
    pub(crate) fn new<S: Into<String>>(reason: S) -> Self {
        PublishError {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "publication rejected: {}", self.reason)
    }
}

impl std::error::Error for PublishError {}
