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

//! Payload primitives.
use std::borrow::Cow;

use bytes::Bytes;
use weft_result::{werror, WResult};

/// The payload of messages flowing through the fabric.
///
/// `Payload` is an immutable, cheaply cloneable byte container. It carries no
/// type information of its own; pair it with an
/// [`Encoding`](crate::bytes::Encoding) to hint receivers at how to
/// interpret the bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    /// An empty payload.
    pub const fn empty() -> Self {
        Payload(Bytes::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw bytes of this payload.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    /// Interprets the payload as a UTF-8 string.
    pub fn try_to_string(&self) -> WResult<Cow<'_, str>> {
        let s = core::str::from_utf8(&self.0)
            .map_err(|e| werror!(e => "payload is not valid UTF-8"))?;
        Ok(Cow::Borrowed(s))
    }
}

impl core::fmt::Debug for Payload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload(Bytes::from(value))
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for Payload {
    fn from(value: [u8; N]) -> Self {
        Payload(Bytes::copy_from_slice(&value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload(Bytes::from(value.into_bytes()))
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<&Payload> for Payload {
    fn from(value: &Payload) -> Self {
        value.clone()
    }
}

impl From<Payload> for Vec<u8> {
    fn from(value: Payload) -> Self {
        value.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        let payload = Payload::from("hello");
        assert_eq!(payload.try_to_string().unwrap(), "hello");
        assert_eq!(payload.len(), 5);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let payload = Payload::from(vec![0xff, 0xfe]);
        assert!(payload.try_to_string().is_err());
        assert_eq!(&*payload.to_bytes(), &[0xff, 0xfe]);
    }

    #[test]
    fn empty() {
        assert!(Payload::empty().is_empty());
        assert_eq!(Payload::default(), Payload::empty());
    }
}
