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
use std::{
    fmt,
    future::{IntoFuture, Ready},
    ops::Deref,
    sync::Arc,
};

use weft_config::{Config, EndPoint, WhatAmI, WhatAmIMatcher};
use weft_core::{Resolvable, Wait};
use weft_result::WResult;
use weft_runtime::TerminatableTask;

use crate::{
    api::{
        handlers::{Callback, DefaultHandler, IntoHandler},
        info::WeftId,
        session::API_DATA_RECEPTION_CHANNEL_SIZE,
    },
    net::{
        fabric::{fabric, Node},
        spawn_delivery,
    },
};

/// An announcement of a discoverable session, as received by a [`Scout`].
#[derive(Clone)]
pub struct Hello {
    pub(crate) whatami: WhatAmI,
    pub(crate) id: WeftId,
    pub(crate) locators: Vec<EndPoint>,
}

impl Hello {
    pub(crate) fn new(node: &Node) -> Self {
        Hello {
            whatami: node.whatami,
            id: node.id,
            locators: node.locators.clone(),
        }
    }

    /// The mode of the announced session.
    pub fn whatami(&self) -> WhatAmI {
        self.whatami
    }

    /// The id of the announced session.
    pub fn zid(&self) -> WeftId {
        self.id
    }

    /// The locators the announced session listens on.
    pub fn locators(&self) -> &[EndPoint] {
        &self.locators
    }
}

impl fmt::Display for Hello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hello {{ id: {}, whatami: {}, locators: {:?} }}",
            self.id, self.whatami, self.locators
        )
    }
}

impl fmt::Debug for Hello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hello")
            .field("id", &self.id)
            .field("whatami", &self.whatami)
            .field("locators", &self.locators)
            .finish()
    }
}

pub(crate) struct ScoutInner {
    scout_id: Option<usize>,
    task: Option<TerminatableTask>,
}

impl ScoutInner {
    fn stop(&mut self) {
        if let Some(id) = self.scout_id.take() {
            fabric().remove_scout(id);
        }
        // Dropping the task lets the delivery worker drain the queued
        // hellos before releasing the callback.
        drop(self.task.take());
    }
}

impl Drop for ScoutInner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A scout listening for [`Hello`] messages of discoverable sessions.
///
/// Scouting stops when the scout is dropped or [`stop`](Scout::stop)ped.
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// use weft::config::WhatAmI;
///
/// let receiver = weft::scout(WhatAmI::Peer | WhatAmI::Router, weft::Config::default())
///     .await
///     .unwrap();
/// while let Ok(hello) = receiver.recv_async().await {
///     println!("{}", hello);
/// }
/// # }
/// ```
pub struct Scout<Handler> {
    pub(crate) scout: ScoutInner,
    pub(crate) receiver: Handler,
}

impl<Handler> Scout<Handler> {
    /// Stops scouting. Hellos already queued are still handed to the
    /// handler.
    pub fn stop(mut self) {
        self.scout.stop();
    }
}

impl<Handler> Deref for Scout<Handler> {
    type Target = Handler;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

/// A builder returned by [`scout`].
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub struct ScoutBuilder<Handler> {
    pub(crate) what: WhatAmIMatcher,
    pub(crate) config: WResult<Config>,
    pub(crate) handler: Handler,
}

impl<Handler> ScoutBuilder<Handler> {
    /// Receive the hellos with a callback.
    pub fn callback<F>(self, callback: F) -> ScoutBuilder<Callback<Hello>>
    where
        F: Fn(Hello) + Send + Sync + 'static,
    {
        self.with(Callback::new(Arc::new(callback)))
    }

    /// Receive the hellos with a mutable callback.
    pub fn callback_mut<F>(self, callback: F) -> ScoutBuilder<Callback<Hello>>
    where
        F: FnMut(Hello) + Send + Sync + 'static,
    {
        self.callback(crate::api::handlers::locked(callback))
    }

    /// Receive the hellos with a [`IntoHandler`].
    pub fn with<H>(self, handler: H) -> ScoutBuilder<H>
    where
        H: IntoHandler<Hello>,
    {
        ScoutBuilder {
            what: self.what,
            config: self.config,
            handler,
        }
    }
}

impl<Handler> Resolvable for ScoutBuilder<Handler>
where
    Handler: IntoHandler<Hello>,
    Handler::Handler: Send,
{
    type To = WResult<Scout<Handler::Handler>>;
}

impl<Handler> Wait for ScoutBuilder<Handler>
where
    Handler: IntoHandler<Hello>,
    Handler::Handler: Send,
{
    fn wait(self) -> Self::To {
        let config = self.config?;
        let (callback, receiver) = self.handler.into_handler();
        if !config.scouting.multicast.enabled {
            // An inert scout: the handler never yields a hello.
            tracing::warn!("scouting requested but multicast scouting is disabled");
            return Ok(Scout {
                scout: ScoutInner {
                    scout_id: None,
                    task: None,
                },
                receiver,
            });
        }
        let (queue, task) = spawn_delivery(callback, *API_DATA_RECEPTION_CHANNEL_SIZE);
        let scout_id = fabric().add_scout(self.what, queue);
        tracing::trace!("scouting for {}", self.what);
        Ok(Scout {
            scout: ScoutInner {
                scout_id: Some(scout_id),
                task: Some(task),
            },
            receiver,
        })
    }
}

impl<Handler> IntoFuture for ScoutBuilder<Handler>
where
    Handler: IntoHandler<Hello>,
    Handler::Handler: Send,
{
    type Output = <Self as Resolvable>::To;
    type IntoFuture = Ready<<Self as Resolvable>::To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

/// Scouts for sessions whose mode matches `what`, yielding a [`Hello`] for
/// each discoverable one, present or future.
///
/// # Examples
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// use weft::config::WhatAmI;
///
/// let receiver = weft::scout(WhatAmI::Peer | WhatAmI::Router, weft::Config::default())
///     .await
///     .unwrap();
/// while let Ok(hello) = receiver.recv_async().await {
///     println!("{}", hello);
/// }
/// # }
/// ```
pub fn scout<I: Into<WhatAmIMatcher>, TryIntoConfig>(
    what: I,
    config: TryIntoConfig,
) -> ScoutBuilder<DefaultHandler>
where
    TryIntoConfig: TryInto<Config>,
    <TryIntoConfig as TryInto<Config>>::Error: Into<crate::Error>,
{
    ScoutBuilder {
        what: what.into(),
        config: config.try_into().map_err(Into::into),
        handler: DefaultHandler::default(),
    }
}
