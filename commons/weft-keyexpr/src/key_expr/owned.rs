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
use core::{
    convert::TryFrom,
    fmt,
    ops::{Deref, Div},
    str::FromStr,
};
use std::sync::Arc;

use super::{borrowed::validate, canon::Canonize, keyexpr};
use crate::InvalidKeyExpr;

/// A [`Arc<str>`] newtype that is statically known to be a valid key
/// expression.
///
/// See [`keyexpr`](super::borrowed::keyexpr) for the exact rules. Cloning an
/// `OwnedKeyExpr` is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OwnedKeyExpr(pub(crate) Arc<str>);

impl OwnedKeyExpr {
    /// Equivalent to `<OwnedKeyExpr as TryFrom>::try_from(t)`.
    ///
    /// Will return an Err if `t` isn't a valid key expression.
    /// Note that to be considered valid, a string MUST be canon.
    pub fn new<T, E>(t: T) -> Result<Self, E>
    where
        Self: TryFrom<T, Error = E>,
    {
        Self::try_from(t)
    }

    /// Canonizes the passed value before returning it as an `OwnedKeyExpr`.
    ///
    /// Will return Err if the passed value isn't a valid key expression
    /// despite canonization.
    pub fn autocanonize<T, E>(mut t: T) -> Result<Self, E>
    where
        Self: TryFrom<T, Error = E>,
        T: Canonize,
    {
        t.canonize();
        Self::new(t)
    }

    /// Constructs an `OwnedKeyExpr` without validating it.
    ///
    /// # Safety
    /// The caller must ensure that `s` is a valid, canon key expression.
    pub unsafe fn from_string_unchecked(s: String) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for OwnedKeyExpr {
    type Target = keyexpr;

    fn deref(&self) -> &Self::Target {
        unsafe { keyexpr::from_str_unchecked(&self.0) }
    }
}

impl AsRef<keyexpr> for OwnedKeyExpr {
    fn as_ref(&self) -> &keyexpr {
        self
    }
}

impl AsRef<str> for OwnedKeyExpr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnedKeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.deref(), f)
    }
}

impl fmt::Display for OwnedKeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.deref(), f)
    }
}

impl From<&keyexpr> for OwnedKeyExpr {
    fn from(ke: &keyexpr) -> Self {
        Self(Arc::from(ke.as_str()))
    }
}

impl From<OwnedKeyExpr> for Arc<str> {
    fn from(ke: OwnedKeyExpr) -> Self {
        ke.0
    }
}

impl From<OwnedKeyExpr> for String {
    fn from(ke: OwnedKeyExpr) -> Self {
        ke.as_str().to_owned()
    }
}

impl TryFrom<&str> for OwnedKeyExpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate(value)?;
        Ok(Self(Arc::from(value)))
    }
}

impl TryFrom<String> for OwnedKeyExpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value.into()))
    }
}

impl TryFrom<&String> for OwnedKeyExpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for OwnedKeyExpr {
    type Err = InvalidKeyExpr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl Div<&keyexpr> for OwnedKeyExpr {
    type Output = OwnedKeyExpr;

    fn div(self, rhs: &keyexpr) -> Self::Output {
        &*self / rhs
    }
}

impl serde::Serialize for OwnedKeyExpr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for OwnedKeyExpr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OwnedKeyExpr::autocanonize(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autocanonize_accepts_non_canon_input() {
        assert_eq!(OwnedKeyExpr::autocanonize("a/**/**".to_string()).unwrap().as_str(), "a/**");
        assert!(OwnedKeyExpr::new("a/**/**").is_err());
    }

    #[test]
    fn division_joins() {
        let a = OwnedKeyExpr::new("demo").unwrap();
        let b = keyexpr::new("example").unwrap();
        assert_eq!((a / b).as_str(), "demo/example");
    }
}
