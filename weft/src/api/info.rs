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

//! Tools to access information about the current weft [`Session`](crate::Session).
use core::fmt;

use weft_config::WhatAmI;
use weft_core::{Resolve, ResolveClosure};

use crate::{api::session::WeakSession, net::fabric::fabric};

/// The global unique id of a weft node.
///
/// Freshly drawn at random for every session; never zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeftId(u128);

impl WeftId {
    pub(crate) fn rand() -> Self {
        // The low bit is forced so the id can never be zero.
        WeftId(rand::random::<u128>() | 1)
    }

    pub(crate) fn to_hlc_id(self) -> uhlc::ID {
        uhlc::ID::try_from(&self.0.to_le_bytes()[..])
            .expect("a non-zero 16-byte id is always a valid HLC id")
    }
}

impl fmt::Display for WeftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl fmt::Debug for WeftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Struct returned by [`Session::info()`](crate::Session::info), allowing to
/// access information about the current weft [`Session`](crate::Session).
///
/// # Examples
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// let session = weft::open(weft::Config::default()).await.unwrap();
/// let info = session.info();
/// let id = info.id().await;
/// # }
/// ```
pub struct SessionInfo {
    pub(crate) session: WeakSession,
}

impl SessionInfo {
    /// Returns the [`WeftId`] of the current weft [`Session`](crate::Session).
    pub fn id(&self) -> impl Resolve<WeftId> + '_ {
        ResolveClosure::new(move || self.session.id())
    }

    /// Returns the [`WeftId`] of the peer nodes this session currently shares
    /// the fabric with.
    pub fn peers_id(&self) -> impl Resolve<Vec<WeftId>> + '_ {
        ResolveClosure::new(move || self.others(WhatAmI::Peer))
    }

    /// Returns the [`WeftId`] of the router nodes this session currently
    /// shares the fabric with.
    pub fn routers_id(&self) -> impl Resolve<Vec<WeftId>> + '_ {
        ResolveClosure::new(move || self.others(WhatAmI::Router))
    }

    fn others(&self, what: WhatAmI) -> Vec<WeftId> {
        if self.session.is_closed() {
            return Vec::new();
        }
        let this = self.session.id();
        fabric()
            .nodes()
            .into_iter()
            .filter(|n| n.whatami == what && n.id != this)
            .map(|n| n.id)
            .collect()
    }
}
