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
use core::{fmt, ops::Deref};

use weft_keyexpr::{keyexpr, InvalidKeyExpr, OwnedKeyExpr};

#[derive(Clone)]
pub(crate) enum KeyExprInner<'a> {
    Borrowed(&'a keyexpr),
    Owned(OwnedKeyExpr),
}

/// A possibly-owned version of [`keyexpr`] that may carry optimisations for
/// use with a [`Session`](crate::Session).
///
/// `KeyExpr` derefs to [`keyexpr`], so all set operations (intersection,
/// inclusion...) are available on it directly.
#[derive(Clone)]
pub struct KeyExpr<'a>(pub(crate) KeyExprInner<'a>);

impl<'a> KeyExpr<'a> {
    /// Constructs a [`KeyExpr`] from anything convertible to it.
    ///
    /// Like any other constructor, it rejects invalid or non-canon input.
    pub fn new<T, E>(t: T) -> Result<Self, E>
    where
        Self: TryFrom<T, Error = E>,
    {
        Self::try_from(t)
    }

    /// Canonizes the passed string before constructing a [`KeyExpr`] from it.
    pub fn autocanonize(s: String) -> Result<Self, InvalidKeyExpr> {
        OwnedKeyExpr::autocanonize(s).map(Into::into)
    }

    /// Returns a `'static` clone of `self`, allocating only if `self` was
    /// borrowed.
    pub fn into_owned(self) -> KeyExpr<'static> {
        match self.0 {
            KeyExprInner::Borrowed(ke) => KeyExpr(KeyExprInner::Owned(ke.into())),
            KeyExprInner::Owned(ke) => KeyExpr(KeyExprInner::Owned(ke)),
        }
    }

    pub(crate) fn as_owned(&self) -> OwnedKeyExpr {
        match &self.0 {
            KeyExprInner::Borrowed(ke) => (*ke).into(),
            KeyExprInner::Owned(ke) => ke.clone(),
        }
    }
}

impl Deref for KeyExpr<'_> {
    type Target = keyexpr;

    fn deref(&self) -> &Self::Target {
        match &self.0 {
            KeyExprInner::Borrowed(ke) => ke,
            KeyExprInner::Owned(ke) => ke,
        }
    }
}

impl AsRef<keyexpr> for KeyExpr<'_> {
    fn as_ref(&self) -> &keyexpr {
        self
    }
}

impl AsRef<str> for KeyExpr<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for KeyExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.deref(), f)
    }
}

impl fmt::Display for KeyExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.deref(), f)
    }
}

impl PartialEq for KeyExpr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for KeyExpr<'_> {}

impl core::hash::Hash for KeyExpr<'_> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl PartialEq<str> for KeyExpr<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for KeyExpr<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<'a> From<&'a keyexpr> for KeyExpr<'a> {
    fn from(ke: &'a keyexpr) -> Self {
        KeyExpr(KeyExprInner::Borrowed(ke))
    }
}

impl From<OwnedKeyExpr> for KeyExpr<'static> {
    fn from(ke: OwnedKeyExpr) -> Self {
        KeyExpr(KeyExprInner::Owned(ke))
    }
}

impl<'a> From<&'a KeyExpr<'_>> for KeyExpr<'a> {
    fn from(ke: &'a KeyExpr<'_>) -> Self {
        match &ke.0 {
            KeyExprInner::Borrowed(ke) => KeyExpr(KeyExprInner::Borrowed(*ke)),
            KeyExprInner::Owned(ke) => KeyExpr(KeyExprInner::Owned(ke.clone())),
        }
    }
}

impl From<KeyExpr<'_>> for OwnedKeyExpr {
    fn from(ke: KeyExpr<'_>) -> Self {
        match ke.0 {
            KeyExprInner::Borrowed(ke) => ke.into(),
            KeyExprInner::Owned(ke) => ke,
        }
    }
}

impl From<KeyExpr<'_>> for String {
    fn from(ke: KeyExpr<'_>) -> Self {
        ke.as_str().to_owned()
    }
}

impl<'a> TryFrom<&'a str> for KeyExpr<'a> {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        Ok(KeyExpr(KeyExprInner::Borrowed(keyexpr::new(value)?)))
    }
}

impl TryFrom<String> for KeyExpr<'static> {
    type Error = InvalidKeyExpr;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(KeyExpr(KeyExprInner::Owned(OwnedKeyExpr::try_from(value)?)))
    }
}

impl<'a> TryFrom<&'a String> for KeyExpr<'a> {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_and_owned_compare_equal() {
        let borrowed = KeyExpr::try_from("demo/example").unwrap();
        let owned = KeyExpr::try_from("demo/example".to_string()).unwrap();
        assert_eq!(borrowed, owned);
        assert_eq!(borrowed, "demo/example");
    }

    #[test]
    fn into_owned_preserves_value() {
        let ke = KeyExpr::try_from("demo/**").unwrap().into_owned();
        assert_eq!(ke, "demo/**");
        assert!(ke.is_wild());
    }

    #[test]
    fn autocanonize() {
        let ke = KeyExpr::autocanonize("demo/**/**".to_string()).unwrap();
        assert_eq!(ke, "demo/**");
        assert!(KeyExpr::try_from("demo/**/**").is_err());
    }
}
