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

//! Selectors to issue queries.
use core::fmt;
use std::borrow::Cow;

use weft_keyexpr::InvalidKeyExpr;

use crate::api::key_expr::KeyExpr;

/// A set of parameters accompanying a query, serialized as
/// `key1=value1;key2=value2`.
///
/// The fabric routes queries on the key expression alone; parameters are
/// opaque to it and carried verbatim to the matching queryables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameters<'a>(Cow<'a, str>);

impl<'a> Parameters<'a> {
    const LIST_SEP: char = ';';
    const FIELD_SEP: char = '=';

    pub fn empty() -> Self {
        Parameters(Cow::Borrowed(""))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `(key, value)` pairs, in serialization order.
    ///
    /// A parameter without a `=` is yielded with an empty value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + Clone {
        self.0
            .split(Self::LIST_SEP)
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once(Self::FIELD_SEP).unwrap_or((p, "")))
    }

    /// Returns the value of the given parameter.
    ///
    /// If the parameter was given more than once, the last value wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().filter(|(k, _)| *k == key).map(|(_, v)| v).last()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn into_owned(self) -> Parameters<'static> {
        Parameters(Cow::Owned(self.0.into_owned()))
    }
}

impl<'a> From<&'a str> for Parameters<'a> {
    fn from(value: &'a str) -> Self {
        Parameters(Cow::Borrowed(value))
    }
}

impl From<String> for Parameters<'static> {
    fn from(value: String) -> Self {
        Parameters(Cow::Owned(value))
    }
}

impl fmt::Display for Parameters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An expression identifying a selection of resources, as used by `get`.
///
/// A selector is the conjunction of a [key expression](KeyExpr), restricting
/// the set of keys the query addresses, and a set of [`Parameters`] with
/// query-specific meaning. Its text form is `<key_expr>?<parameters>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector<'a> {
    pub(crate) key_expr: KeyExpr<'a>,
    pub(crate) parameters: Parameters<'a>,
}

impl<'a> Selector<'a> {
    pub fn new<K, P>(key_expr: K, parameters: P) -> Self
    where
        K: Into<KeyExpr<'a>>,
        P: Into<Parameters<'a>>,
    {
        Self {
            key_expr: key_expr.into(),
            parameters: parameters.into(),
        }
    }

    /// The key expression part of this selector.
    pub fn key_expr(&self) -> &KeyExpr<'a> {
        &self.key_expr
    }

    /// The parameters part of this selector.
    pub fn parameters(&self) -> &Parameters<'a> {
        &self.parameters
    }

    pub fn into_owned(self) -> Selector<'static> {
        Selector {
            key_expr: self.key_expr.into_owned(),
            parameters: self.parameters.into_owned(),
        }
    }
}

impl fmt::Display for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.key_expr)
        } else {
            write!(f, "{}?{}", self.key_expr, self.parameters)
        }
    }
}

impl<'a> From<KeyExpr<'a>> for Selector<'a> {
    fn from(key_expr: KeyExpr<'a>) -> Self {
        Selector {
            key_expr,
            parameters: Parameters::empty(),
        }
    }
}

impl<'a> From<&'a KeyExpr<'_>> for Selector<'a> {
    fn from(key_expr: &'a KeyExpr<'_>) -> Self {
        Selector {
            key_expr: key_expr.into(),
            parameters: Parameters::empty(),
        }
    }
}

impl<'a> TryFrom<&'a str> for Selector<'a> {
    type Error = InvalidKeyExpr;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        match s.split_once('?') {
            Some((key_expr, parameters)) => Ok(Selector {
                key_expr: key_expr.try_into()?,
                parameters: parameters.into(),
            }),
            None => Ok(Selector {
                key_expr: s.try_into()?,
                parameters: Parameters::empty(),
            }),
        }
    }
}

impl TryFrom<String> for Selector<'static> {
    type Error = InvalidKeyExpr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Selector::try_from(s.as_str())?.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_key_and_parameters() {
        let selector = Selector::try_from("demo/**?ok=1;level=2").unwrap();
        assert_eq!(*selector.key_expr(), "demo/**");
        assert_eq!(selector.parameters().get("ok"), Some("1"));
        assert_eq!(selector.parameters().get("level"), Some("2"));
        assert_eq!(selector.parameters().get("missing"), None);
    }

    #[test]
    fn last_value_wins() {
        let selector = Selector::try_from("a/b?k=1;k=2").unwrap();
        assert_eq!(selector.parameters().get("k"), Some("2"));
    }

    #[test]
    fn bare_key_has_no_parameters() {
        let selector = Selector::try_from("a/b").unwrap();
        assert!(selector.parameters().is_empty());
        assert_eq!(selector.to_string(), "a/b");
    }

    #[test]
    fn flag_parameters_have_empty_values() {
        let selector = Selector::try_from("a/b?fast;k=v").unwrap();
        assert_eq!(selector.parameters().get("fast"), Some(""));
        assert!(selector.parameters().contains_key("fast"));
    }

    #[test]
    fn invalid_key_part_is_rejected() {
        assert!(Selector::try_from("a//b?k=v").is_err());
    }
}
