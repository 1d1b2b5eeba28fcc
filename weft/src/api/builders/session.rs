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

use weft_config::Config;
use weft_core::{Resolvable, Wait};
use weft_result::WResult;

use crate::api::{error::ConnectionError, session::Session};

/// A builder returned by [`open`](crate::open).
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct OpenBuilder {
    pub(crate) config: WResult<Config>,
}

impl Resolvable for OpenBuilder {
    type To = WResult<Session>;
}

impl Wait for OpenBuilder {
    fn wait(self) -> Self::To {
        let config = self
            .config
            .map_err(|e| ConnectionError::with_source("invalid configuration", e))?;
        Session::new(config)
    }
}

impl IntoFuture for OpenBuilder {
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}
