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

use phf::phf_map;

/// Default encoding values used by weft.
///
/// An encoding has a similar role to the `Content-type` HTTP header: it hints
/// receivers at how a [`Payload`](crate::bytes::Payload) should be
/// interpreted, but is never enforced by the fabric itself.
///
/// A set of associated constants covers the common cases; they are carried as
/// a compact integer id. Any other encoding can be created from its string
/// representation and travels as an opaque string: it is rendered back
/// verbatim rather than failing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Encoding {
    pub(crate) id: u16,
    pub(crate) schema: Option<String>,
}

impl Encoding {
    const SCHEMA_SEP: char = ';';
    const CUSTOM_ID: u16 = u16::MAX;

    /// Just bytes. The default encoding.
    pub const WEFT_BYTES: Encoding = Self::new(0);
    /// A UTF-8 string.
    pub const WEFT_STRING: Encoding = Self::new(1);
    /// An application-specific stream of bytes.
    pub const APPLICATION_OCTET_STREAM: Encoding = Self::new(2);
    /// A textual file.
    pub const TEXT_PLAIN: Encoding = Self::new(3);
    /// JSON data intended to be consumed by an application.
    pub const APPLICATION_JSON: Encoding = Self::new(4);
    /// JSON data intended to be human readable.
    pub const TEXT_JSON: Encoding = Self::new(5);
    /// A Concise Binary Object Representation (CBOR) data stream.
    pub const APPLICATION_CBOR: Encoding = Self::new(6);
    /// A Common Data Representation (CDR) serialized payload.
    pub const APPLICATION_CDR: Encoding = Self::new(7);

    const fn new(id: u16) -> Self {
        Encoding { id, schema: None }
    }

    /// Set a schema to this encoding. Weft does not define what a schema is
    /// and its semantics is left to the implementer. E.g. a common schema for
    /// `text/plain` encoding is `utf-8`.
    pub fn with_schema<S: Into<String>>(mut self, s: S) -> Self {
        self.schema = Some(s.into());
        self
    }

    fn id_to_str(id: u16) -> Option<&'static str> {
        match id {
            0 => Some("weft/bytes"),
            1 => Some("weft/string"),
            2 => Some("application/octet-stream"),
            3 => Some("text/plain"),
            4 => Some("application/json"),
            5 => Some("text/json"),
            6 => Some("application/cbor"),
            7 => Some("application/cdr"),
            _ => None,
        }
    }
}

static STR_TO_ID: phf::Map<&'static str, u16> = phf_map! {
    "weft/bytes" => 0,
    "weft/string" => 1,
    "application/octet-stream" => 2,
    "text/plain" => 3,
    "application/json" => 4,
    "text/json" => 5,
    "application/cbor" => 6,
    "application/cdr" => 7,
};

impl Default for Encoding {
    fn default() -> Self {
        Self::WEFT_BYTES
    }
}

impl From<&str> for Encoding {
    fn from(t: &str) -> Self {
        let (prefix, schema) = match t.split_once(Encoding::SCHEMA_SEP) {
            Some((prefix, schema)) => (prefix, Some(schema)),
            None => (t, None),
        };
        match STR_TO_ID.get(prefix) {
            Some(&id) => Encoding {
                id,
                schema: schema.map(str::to_string),
            },
            // Unknown encodings travel as their verbatim string form.
            None => Encoding {
                id: Encoding::CUSTOM_ID,
                schema: Some(t.to_string()),
            },
        }
    }
}

impl From<String> for Encoding {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&Encoding> for Encoding {
    fn from(value: &Encoding) -> Self {
        value.clone()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (Self::id_to_str(self.id), &self.schema) {
            (Some(s), None) => f.write_str(s),
            (Some(s), Some(schema)) => write!(f, "{}{}{}", s, Self::SCHEMA_SEP, schema),
            (None, Some(schema)) => f.write_str(schema),
            (None, None) => write!(f, "unknown({})", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings_round_trip() {
        for encoding in [
            Encoding::WEFT_BYTES,
            Encoding::WEFT_STRING,
            Encoding::TEXT_PLAIN,
            Encoding::APPLICATION_JSON,
        ] {
            assert_eq!(Encoding::from(encoding.to_string()), encoding);
        }
    }

    #[test]
    fn schema_is_preserved() {
        let encoding = Encoding::TEXT_PLAIN.with_schema("utf-8");
        assert_eq!(encoding.to_string(), "text/plain;utf-8");
        assert_eq!(Encoding::from("text/plain;utf-8"), encoding);
    }

    #[test]
    fn unknown_encodings_are_verbatim() {
        let encoding = Encoding::from("application/x-frob");
        assert_eq!(encoding.to_string(), "application/x-frob");
        assert_ne!(encoding, Encoding::WEFT_BYTES);
    }

    #[test]
    fn default_is_bytes() {
        assert_eq!(Encoding::default(), Encoding::WEFT_BYTES);
        assert_eq!(Encoding::default().to_string(), "weft/bytes");
    }
}
