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

use anyhow::Error as AnyError;

/// The error type shared by all weft operations.
///
/// Errors are boxed so that concrete error types (like the closed-resource or
/// invalid-key-expression markers) can be recovered with
/// [`downcast_ref`](std::error::Error) when callers need to tell them apart.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The result type shared by all weft operations.
pub type WResult<T> = core::result::Result<T, Error>;

/// An error carrying the file and line it was raised at, plus an optional
/// source error it was converted from.
///
/// Use the [`werror!`] and [`bail!`] macros rather than building these by hand.
pub struct WError {
    error: AnyError,
    file: &'static str,
    line: u32,
    source: Option<Error>,
}

impl WError {
    pub fn new<E: Into<AnyError>>(error: E, file: &'static str, line: u32) -> WError {
        WError {
            error: error.into(),
            file,
            line,
            source: None,
        }
    }

    pub fn set_source<S: Into<Error>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl std::error::Error for WError {
    fn source(&self) -> Option<&'_ (dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|r| r.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Debug for WError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Display for WError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}.", self.error, self.file, self.line)?;
        if let Some(s) = &self.source {
            write!(f, " - Caused by {}", *s)?;
        }
        Ok(())
    }
}

pub use anyhow::anyhow;

/// Creates a [`WError`] from a format string, an error value, or a
/// `source => format` pair.
#[macro_export]
macro_rules! werror {
    ($source: expr => $($t: tt)*) => {
        $crate::WError::new($crate::anyhow!($($t)*), file!(), line!()).set_source($source)
    };
    ($t: literal) => {
        $crate::WError::new($crate::anyhow!($t), file!(), line!())
    };
    ($t: expr) => {
        $crate::WError::new($t, file!(), line!())
    };
    ($($t: tt)*) => {
        $crate::WError::new($crate::anyhow!($($t)*), file!(), line!())
    };
}

// This macro is a shorthand for an early return with a WError
#[macro_export]
macro_rules! bail {
    ($($t: tt)*) => {
        return Err($crate::werror!($($t)*).into())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faulty() -> WResult<()> {
        bail!("it went wrong: {}", 42)
    }

    #[test]
    fn werror_formats_location() {
        let err = faulty().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("it went wrong: 42"));
        assert!(msg.contains("lib.rs"));
    }

    #[test]
    fn werror_chains_source() {
        let source = werror!("inner");
        let outer: Error = werror!(source => "outer").into();
        assert!(outer.to_string().contains("Caused by"));
        assert!(std::error::Error::source(outer.as_ref()).is_some());
    }
}
