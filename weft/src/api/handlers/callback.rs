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

//! Callback handler trait.
use std::sync::Arc;

use weft_core::wlock;

use crate::api::handlers::IntoHandler;

/// A function that can be called multiple times to handle a stream of `T`
/// events, cloneable and shareable across the fabric's delivery workers.
pub struct Callback<T>(Arc<dyn Fn(T) + Send + Sync>);

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> core::fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Callback").finish()
    }
}

impl<T> Callback<T> {
    /// Instantiates a `Callback` from a shareable closure.
    pub fn new(cb: Arc<dyn Fn(T) + Send + Sync>) -> Self {
        Self(cb)
    }

    /// Calls the inner closure.
    pub fn call(&self, arg: T) {
        self.0(arg)
    }
}

impl<T: Send> IntoHandler<T> for Callback<T> {
    type Handler = ();
    const BACKGROUND: bool = true;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        (self, ())
    }
}

/// Creates a callback/handler pair from an explicit callback and an
/// independently created handler, when neither is in charge of the other.
impl<T, H> IntoHandler<T> for (Callback<T>, H)
where
    T: Send,
    H: Send,
{
    type Handler = H;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        self
    }
}

/// A wrapper around a callback, running a second callback when the first one
/// is dropped, i.e. when its declaring entity is undeclared.
pub struct CallbackDrop<Callback, DropFn>
where
    DropFn: FnMut() + Send + Sync + 'static,
{
    pub callback: Callback,
    pub drop: DropFn,
}

impl<Callback, DropFn> Drop for CallbackDrop<Callback, DropFn>
where
    DropFn: FnMut() + Send + Sync + 'static,
{
    fn drop(&mut self) {
        (self.drop)()
    }
}

impl<T, F, DropFn> IntoHandler<T> for CallbackDrop<F, DropFn>
where
    F: Fn(T) + Send + Sync + 'static,
    DropFn: FnMut() + Send + Sync + 'static,
{
    type Handler = ();
    const BACKGROUND: bool = true;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        (Callback::new(Arc::new(move |t| (self.callback)(t))), ())
    }
}

/// Wraps a `FnMut` in a `Mutex` so it can be used where a `Fn` callback is
/// expected.
pub fn locked<T>(fnmut: impl FnMut(T)) -> impl Fn(T) {
    let lock = std::sync::Mutex::new(fnmut);
    move |x| wlock!(lock)(x)
}
