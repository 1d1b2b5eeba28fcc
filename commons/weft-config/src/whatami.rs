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
use core::{fmt, ops::BitOr, str::FromStr};

use serde::{Deserialize, Serialize};

/// The role a node plays in the fabric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WhatAmI {
    Router = 0b001,
    #[default]
    Peer = 0b010,
    Client = 0b100,
}

impl WhatAmI {
    const STR_ROUTER: &'static str = "router";
    const STR_PEER: &'static str = "peer";
    const STR_CLIENT: &'static str = "client";

    pub const fn to_str(self) -> &'static str {
        match self {
            WhatAmI::Router => Self::STR_ROUTER,
            WhatAmI::Peer => Self::STR_PEER,
            WhatAmI::Client => Self::STR_CLIENT,
        }
    }
}

impl FromStr for WhatAmI {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::STR_ROUTER => Ok(WhatAmI::Router),
            Self::STR_PEER => Ok(WhatAmI::Peer),
            Self::STR_CLIENT => Ok(WhatAmI::Client),
            _ => Err(format!(
                "{s} is not a valid WhatAmI value. Valid values are: router, peer, client."
            )),
        }
    }
}

impl fmt::Display for WhatAmI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl Serialize for WhatAmI {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_str())
    }
}

impl<'de> Deserialize<'de> for WhatAmI {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A bit-set of [`WhatAmI`] values, used to filter which node roles a scout
/// looks for.
///
/// Build it with `|`: `WhatAmI::Peer | WhatAmI::Router`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WhatAmIMatcher(u8);

impl WhatAmIMatcher {
    pub const fn empty() -> Self {
        WhatAmIMatcher(0)
    }

    pub const fn router(self) -> Self {
        WhatAmIMatcher(self.0 | WhatAmI::Router as u8)
    }

    pub const fn peer(self) -> Self {
        WhatAmIMatcher(self.0 | WhatAmI::Peer as u8)
    }

    pub const fn client(self) -> Self {
        WhatAmIMatcher(self.0 | WhatAmI::Client as u8)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn matches(self, what: WhatAmI) -> bool {
        self.0 & what as u8 != 0
    }
}

impl Default for WhatAmIMatcher {
    /// Scouting looks for peers and routers unless told otherwise.
    fn default() -> Self {
        Self::empty().peer().router()
    }
}

impl From<WhatAmI> for WhatAmIMatcher {
    fn from(what: WhatAmI) -> Self {
        WhatAmIMatcher(what as u8)
    }
}

impl BitOr<WhatAmI> for WhatAmI {
    type Output = WhatAmIMatcher;

    fn bitor(self, rhs: WhatAmI) -> Self::Output {
        WhatAmIMatcher(self as u8 | rhs as u8)
    }
}

impl BitOr<WhatAmI> for WhatAmIMatcher {
    type Output = WhatAmIMatcher;

    fn bitor(self, rhs: WhatAmI) -> Self::Output {
        WhatAmIMatcher(self.0 | rhs as u8)
    }
}

impl BitOr for WhatAmIMatcher {
    type Output = WhatAmIMatcher;

    fn bitor(self, rhs: Self) -> Self::Output {
        WhatAmIMatcher(self.0 | rhs.0)
    }
}

impl fmt::Display for WhatAmIMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for what in [WhatAmI::Router, WhatAmI::Peer, WhatAmI::Client] {
            if self.matches(what) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(what.to_str())?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_composition() {
        let m = WhatAmI::Peer | WhatAmI::Router;
        assert!(m.matches(WhatAmI::Peer));
        assert!(m.matches(WhatAmI::Router));
        assert!(!m.matches(WhatAmI::Client));
        assert_eq!(m, WhatAmIMatcher::default());
        assert_eq!(m.to_string(), "router|peer");
    }

    #[test]
    fn single_role_matcher() {
        let m: WhatAmIMatcher = WhatAmI::Client.into();
        assert!(m.matches(WhatAmI::Client));
        assert!(!m.matches(WhatAmI::Peer));
    }
}
