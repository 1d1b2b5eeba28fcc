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
    borrow::Borrow,
    convert::{TryFrom, TryInto},
    fmt,
    ops::{Deref, Div},
};

use super::{canon::Canonize, intersect, OwnedKeyExpr};
use crate::{InvalidKeyExpr, DOUBLE_WILD, FORBIDDEN_CHARS, SINGLE_WILD};

/// A [`str`] newtype that is statically known to be a valid key expression.
///
/// Key expressions are a `/`-separated list of non-empty UTF-8 chunks. A chunk
/// is either a literal token, the single wildcard `*` (matching exactly one
/// chunk) or the double wildcard `**` (matching any amount of chunks,
/// including none). Wildcards are only meaningful when the expression is used
/// as a match pattern; keys addressed by `put`/`delete` must be non-wild.
///
/// Key expressions may never start or end with `'/'`, nor contain `"//"` or
/// any of the characters `#?$`. They must also be in canon form (no `**`
/// chunk adjacent to another wildcard chunk), which guarantees that two
/// expressions denote the same set of keys if and only if they are the same
/// string. Safe constructors reject non-canon input; [`keyexpr::autocanonize`]
/// canonizes it for you instead.
#[allow(non_camel_case_types)]
#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct keyexpr(pub(crate) str);

impl keyexpr {
    /// Equivalent to `<&keyexpr as TryFrom>::try_from(t)`.
    ///
    /// Will return an Err if `t` isn't a valid key expression.
    /// Note that to be considered valid, a string MUST be canon.
    pub fn new<'a, T, E>(t: &'a T) -> Result<&'a Self, E>
    where
        &'a Self: TryFrom<&'a T, Error = E>,
        T: ?Sized,
    {
        t.try_into()
    }

    /// Canonizes the passed value before returning it as a `&keyexpr`.
    ///
    /// Will return Err if the passed value isn't a valid key expression
    /// despite canonization.
    pub fn autocanonize<'a, T, E>(t: &'a mut T) -> Result<&'a Self, E>
    where
        &'a Self: TryFrom<&'a T, Error = E>,
        T: Canonize + ?Sized,
    {
        t.canonize();
        Self::new(t)
    }

    /// Returns `true` if the `keyexpr`s intersect, i.e. there exists at least
    /// one key which is contained in both of the sets defined by `self` and
    /// `other`.
    ///
    /// This is the predicate the fabric uses to route samples and queries to
    /// subscribers and queryables.
    pub fn intersects(&self, other: &Self) -> bool {
        intersect::intersect(&self.0, &other.0)
    }

    /// Returns `true` if `self` includes `other`, i.e. the set defined by
    /// `self` contains every key belonging to the set defined by `other`.
    pub fn includes(&self, other: &Self) -> bool {
        intersect::includes(&self.0, &other.0)
    }

    /// Returns the relation between `self` and `other` from `self`'s point of
    /// view ([`SetIntersectionLevel::Includes`] signifies that `self` includes
    /// `other`).
    pub fn relation_to(&self, other: &Self) -> SetIntersectionLevel {
        use SetIntersectionLevel::*;
        if self.intersects(other) {
            if self == other {
                Equals
            } else if self.includes(other) {
                Includes
            } else {
                Intersects
            }
        } else {
            Disjoint
        }
    }

    /// Joins both sides, inserting a `/` in between them.
    ///
    /// This should be your preferred method when concatenating path segments.
    pub fn join<S: AsRef<str> + ?Sized>(&self, other: &S) -> Result<OwnedKeyExpr, InvalidKeyExpr> {
        OwnedKeyExpr::autocanonize(format!("{}/{}", self, other.as_ref()))
    }

    /// Returns `true` if `self` contains any wildcard chunk.
    pub fn is_wild(&self) -> bool {
        self.0.contains(SINGLE_WILD)
    }

    /// The chunks of this key expression.
    pub fn chunks(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// # Safety
    /// The caller must ensure that `s` is a valid, canon key expression.
    pub const unsafe fn from_str_unchecked(s: &str) -> &Self {
        core::mem::transmute(s)
    }
}

pub(crate) fn validate(s: &str) -> Result<(), InvalidKeyExpr> {
    if s.is_empty() {
        return Err(InvalidKeyExpr::new(s, "key expressions may not be empty"));
    }
    if s.starts_with('/') {
        return Err(InvalidKeyExpr::new(s, "key expressions may not start with '/'"));
    }
    if s.ends_with('/') {
        return Err(InvalidKeyExpr::new(s, "key expressions may not end with '/'"));
    }
    let mut previous_wild = false;
    for chunk in s.split('/') {
        if chunk.is_empty() {
            return Err(InvalidKeyExpr::new(s, "key expressions may not contain \"//\""));
        }
        if chunk.contains(FORBIDDEN_CHARS) {
            return Err(InvalidKeyExpr::new(
                s,
                "key expressions may not contain any of '#', '?', '$'",
            ));
        }
        match chunk {
            SINGLE_WILD => {
                if previous_wild {
                    return Err(InvalidKeyExpr::new(
                        s,
                        "non-canon form: \"**/*\" must be written \"*/**\"",
                    ));
                }
            }
            DOUBLE_WILD => {
                previous_wild = true;
                continue;
            }
            _ => {
                if chunk.contains('*') {
                    return Err(InvalidKeyExpr::new(
                        s,
                        "'*' may only be used as a whole chunk",
                    ));
                }
            }
        }
        previous_wild = false;
    }
    // A second "**" right after a "**" is non-canon too.
    if s.contains("**/**") {
        return Err(InvalidKeyExpr::new(
            s,
            "non-canon form: \"**/**\" must be written \"**\"",
        ));
    }
    Ok(())
}

/// The possible relations between two sets of keys.
///
/// Note that [`Equals`](SetIntersectionLevel::Equals) implies
/// [`Includes`](SetIntersectionLevel::Includes), which itself implies
/// [`Intersects`](SetIntersectionLevel::Intersects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetIntersectionLevel {
    Disjoint,
    Intersects,
    Includes,
    Equals,
}

impl fmt::Debug for keyexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ke`{}`", &self.0)
    }
}

impl fmt::Display for keyexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Deref for keyexpr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for keyexpr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> TryFrom<&'a str> for &'a keyexpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        validate(value)?;
        Ok(unsafe { keyexpr::from_str_unchecked(value) })
    }
}

impl<'a> TryFrom<&'a mut str> for &'a keyexpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a mut str) -> Result<Self, Self::Error> {
        (value as &'a str).try_into()
    }
}

impl<'a> TryFrom<&'a String> for &'a keyexpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

impl<'a> TryFrom<&'a mut String> for &'a keyexpr {
    type Error = InvalidKeyExpr;

    fn try_from(value: &'a mut String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

impl Div<&keyexpr> for &keyexpr {
    type Output = OwnedKeyExpr;

    fn div(self, rhs: &keyexpr) -> Self::Output {
        // Joining two valid keyexprs can only fail canonization, which
        // autocanonize fixes.
        OwnedKeyExpr::autocanonize(format!("{self}/{rhs}"))
            .expect("joining two valid key expressions should always yield a valid one")
    }
}

impl ToOwned for keyexpr {
    type Owned = OwnedKeyExpr;

    fn to_owned(&self) -> Self::Owned {
        OwnedKeyExpr::from(self)
    }
}

impl Borrow<keyexpr> for OwnedKeyExpr {
    fn borrow(&self) -> &keyexpr {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_key_expressions() {
        for ke in [
            "a",
            "a/b/c",
            "demo/example/test",
            "*",
            "**",
            "a/*/c",
            "a/**",
            "*/**",
            "a/*/**",
            "a-b/c.d/e_f",
        ] {
            assert!(keyexpr::new(ke).is_ok(), "{ke} should be valid");
        }
    }

    #[test]
    fn invalid_key_expressions() {
        for ke in [
            "",
            "/",
            "/a",
            "a/",
            "a//b",
            "a/b*",
            "a/*b/c",
            "a/x**/c",
            "a/b?",
            "a/#b",
            "a/$b",
            "**/**",
            "**/*",
            "a/**/**/b",
        ] {
            assert!(keyexpr::new(ke).is_err(), "{ke:?} should be invalid");
        }
    }

    #[test]
    fn round_trip_is_stable() {
        for ke in ["a/b/c", "a/*/c", "a/**", "*/**"] {
            let parsed = keyexpr::new(ke).unwrap();
            let rendered = parsed.to_string();
            assert_eq!(keyexpr::new(rendered.as_str()).unwrap(), parsed);
        }
    }

    #[test]
    fn join_inserts_separator() {
        let ke = keyexpr::new("demo/example").unwrap();
        assert_eq!(ke.join("test").unwrap().as_str(), "demo/example/test");
        let topic = keyexpr::new("test").unwrap();
        assert_eq!((ke / topic).as_str(), "demo/example/test");
    }

    #[test]
    fn wildness() {
        assert!(keyexpr::new("a/*/c").unwrap().is_wild());
        assert!(keyexpr::new("**").unwrap().is_wild());
        assert!(!keyexpr::new("a/b/c").unwrap().is_wild());
    }
}
