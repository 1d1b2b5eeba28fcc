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
use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use weft_result::{bail, Error};

/// A `<proto>/<address>` pair naming a place a node can be reached at,
/// e.g. `tcp/127.0.0.1:7447`.
///
/// The core validates the shape but never dials endpoints itself: they are
/// carried as data (locators in [`Hello`](https://docs.rs/weft) messages, and
/// connect/listen entries in [`Config`](crate::Config)).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndPoint {
    inner: String,
}

impl EndPoint {
    pub fn protocol(&self) -> &str {
        self.inner.split_once('/').map(|(p, _)| p).unwrap_or("")
    }

    pub fn address(&self) -> &str {
        self.inner.split_once('/').map(|(_, a)| a).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl FromStr for EndPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((proto, address)) if !proto.is_empty() && !address.is_empty() => Ok(EndPoint {
                inner: s.to_string(),
            }),
            _ => bail!("invalid endpoint {:?}: expected <proto>/<address>", s),
        }
    }
}

impl TryFrom<&str> for EndPoint {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for EndPoint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl Serialize for EndPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for EndPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parsing() {
        let ep: EndPoint = "tcp/127.0.0.1:7447".parse().unwrap();
        assert_eq!(ep.protocol(), "tcp");
        assert_eq!(ep.address(), "127.0.0.1:7447");
        assert!("tcp".parse::<EndPoint>().is_err());
        assert!("/127.0.0.1".parse::<EndPoint>().is_err());
        assert!("tcp/".parse::<EndPoint>().is_err());
    }
}
