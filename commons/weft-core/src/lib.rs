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

//! ⚠️ WARNING ⚠️
//!
//! This crate is intended for weft's internal use.
//!
//! [Click here for weft's documentation](https://docs.rs/weft/latest/weft)
use std::future::{IntoFuture, Ready};

pub use lazy_static::lazy_static;
pub mod macros;

pub mod log;

pub use weft_result::Error;
pub use weft_result::WResult as Result;

/// A resolvable operation.
///
/// Every weft builder is a `Resolvable` data structure that does nothing until
/// resolved, either synchronously through [`Wait::wait`] or asynchronously by
/// `.await`ing it.
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub trait Resolvable {
    type To: Sized + Send;
}

/// Synchronous resolution of a [`Resolvable`].
pub trait Wait: Resolvable {
    /// Resolves the builder pattern synchronously.
    fn wait(self) -> Self::To;
}

/// A convenience trait for functions returning
/// `impl Resolvable<To = T> + Wait + IntoFuture<Output = T> + Send`.
#[must_use = "Resolvables do nothing unless you resolve them using `.await` or `weft_core::Wait::wait`"]
pub trait Resolve<Output>:
    Resolvable<To = Output> + Wait + IntoFuture<Output = Output> + Send
{
}

impl<T, Output> Resolve<Output> for T where
    T: Resolvable<To = Output> + Wait + IntoFuture<Output = Output> + Send
{
}

/// A [`Resolvable`] backed by a closure, for operations whose synchronous and
/// asynchronous paths are the same plain function call.
pub struct ResolveClosure<C, To>(C)
where
    To: Sized + Send,
    C: FnOnce() -> To + Send;

impl<C, To> ResolveClosure<C, To>
where
    To: Sized + Send,
    C: FnOnce() -> To + Send,
{
    pub fn new(c: C) -> Self {
        Self(c)
    }
}

impl<C, To> Resolvable for ResolveClosure<C, To>
where
    To: Sized + Send,
    C: FnOnce() -> To + Send,
{
    type To = To;
}

impl<C, To> Wait for ResolveClosure<C, To>
where
    To: Sized + Send,
    C: FnOnce() -> To + Send,
{
    fn wait(self) -> Self::To {
        self.0()
    }
}

impl<C, To> IntoFuture for ResolveClosure<C, To>
where
    To: Sized + Send,
    C: FnOnce() -> To + Send,
{
    type Output = To;
    type IntoFuture = Ready<To>;

    fn into_future(self) -> Self::IntoFuture {
        std::future::ready(self.wait())
    }
}

