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

//! Configuration to pass to `weft::open()` and `weft::scout()` functions and
//! associated constants.
use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use weft_result::{bail, werror, WResult};

mod whatami;
pub use whatami::{WhatAmI, WhatAmIMatcher};

mod endpoint;
pub use endpoint::EndPoint;

/// The main configuration structure.
///
/// Most applications build it with one of the helper constructors
/// ([`default()`], [`peer()`], [`client()`], [`router()`]) or parse it from a
/// JSON5 blob or file. All fields are optional in the textual form and
/// default as documented.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The node's mode (`"peer"` by default).
    pub mode: WhatAmI,
    /// Which endpoints to connect to.
    pub connect: EndPointsConf,
    /// Which endpoints to listen on.
    pub listen: EndPointsConf,
    /// Scouting (discovery) toggles.
    pub scouting: ScoutingConf,
}

impl Config {
    /// Parses a JSON5 (or plain JSON) configuration blob.
    pub fn from_json5(input: &str) -> WResult<Self> {
        json5::from_str(input).map_err(|e| werror!(e => "invalid configuration").into())
    }

    /// Reads a configuration file; the deserializer is picked according to
    /// the file extension (`.json`, `.json5`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> WResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| werror!(e => "failed to read {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| werror!(e => "invalid configuration").into())
            }
            Some("json5") | None => Self::from_json5(&content),
            Some(other) => bail!("unsupported configuration format: {}", other),
        }
    }

    /// Reads the configuration file named by the `WEFT_CONFIG` environment
    /// variable, or returns the default configuration if it is unset.
    pub fn from_env() -> WResult<Self> {
        match std::env::var("WEFT_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(werror!(e => "invalid WEFT_CONFIG").into()),
        }
    }

    pub fn set_mode(&mut self, mode: WhatAmI) -> &mut Self {
        self.mode = mode;
        self
    }
}

impl FromStr for Config {
    type Err = weft_result::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json5(s)
    }
}

impl TryFrom<&str> for Config {
    type Error = weft_result::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Config {
    type Error = weft_result::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().parse()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}

/// An endpoint list.
///
/// Deserializes both from the canonical `{ "endpoints": [...] }` form and
/// from the shorthand plain list `["tcp/..."]`; the shorthand is normalized
/// into the canonical form, which is the only internal representation.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct EndPointsConf {
    pub endpoints: Vec<EndPoint>,
}

impl<'de> Deserialize<'de> for EndPointsConf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shorthand {
            List(Vec<EndPoint>),
            Structured { endpoints: Vec<EndPoint> },
        }
        Ok(match Shorthand::deserialize(deserializer)? {
            Shorthand::List(endpoints) | Shorthand::Structured { endpoints } => {
                EndPointsConf { endpoints }
            }
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoutingConf {
    pub multicast: ScoutingMulticastConf,
    pub gossip: GossipConf,
}

impl Default for ScoutingConf {
    fn default() -> Self {
        Self {
            multicast: ScoutingMulticastConf { enabled: true },
            gossip: GossipConf { enabled: true },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScoutingMulticastConf {
    /// Whether this node answers (and issues) multicast scouting probes.
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GossipConf {
    /// Whether this node gossips the nodes it knows about to its neighbours.
    pub enabled: bool,
}

/// Creates a default [`Config`] (peer mode, scouting enabled).
pub fn default() -> Config {
    peer()
}

/// Creates a [`Config`] in peer mode.
pub fn peer() -> Config {
    Config {
        mode: WhatAmI::Peer,
        ..Config::default()
    }
}

/// Creates a [`Config`] in client mode, connecting to the given endpoints.
pub fn client<I: IntoIterator<Item = T>, T: TryInto<EndPoint>>(endpoints: I) -> Config {
    Config {
        mode: WhatAmI::Client,
        connect: EndPointsConf {
            endpoints: endpoints
                .into_iter()
                .filter_map(|e| e.try_into().ok())
                .collect(),
        },
        ..Config::default()
    }
}

/// Creates a [`Config`] in router mode.
pub fn router() -> Config {
    Config {
        mode: WhatAmI::Router,
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_endpoints_normalize() {
        let structured =
            Config::from_json5(r#"{ connect: { endpoints: ["tcp/127.0.0.1:7447"] } }"#).unwrap();
        let shorthand = Config::from_json5(r#"{ connect: ["tcp/127.0.0.1:7447"] }"#).unwrap();
        assert_eq!(structured, shorthand);
        assert_eq!(structured.connect.endpoints.len(), 1);
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.mode, WhatAmI::Peer);
        assert!(config.scouting.multicast.enabled);
        assert!(config.connect.endpoints.is_empty());
    }

    #[test]
    fn mode_parses() {
        let config = Config::from_json5(r#"{ mode: "client" }"#).unwrap();
        assert_eq!(config.mode, WhatAmI::Client);
        assert!(Config::from_json5(r#"{ mode: "gateway" }"#).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_json5(r#"{ not_a_key: 1 }"#).is_err());
    }
}
