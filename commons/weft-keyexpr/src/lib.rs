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
use core::fmt;

pub mod key_expr;
pub use key_expr::{keyexpr, OwnedKeyExpr, SetIntersectionLevel};

/// The single wildcard chunk, matching exactly one chunk.
pub const SINGLE_WILD: &str = "*";
/// The double wildcard chunk, matching any amount of chunks, including none.
pub const DOUBLE_WILD: &str = "**";
/// Characters that may never appear in a key expression.
pub const FORBIDDEN_CHARS: [char; 3] = ['#', '?', '$'];

/// The error returned when a string fails key expression validation.
///
/// This is raised locally, before the offending string ever reaches the
/// fabric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyExpr {
    expr: String,
    reason: &'static str,
}

impl InvalidKeyExpr {
    pub(crate) fn new<S: Into<String>>(expr: S, reason: &'static str) -> Self {
        InvalidKeyExpr {
            expr: expr.into(),
            reason,
        }
    }

    /// The offending string.
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl fmt::Display for InvalidKeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key expression {:?}: {}", self.expr, self.reason)
    }
}

impl std::error::Error for InvalidKeyExpr {}
