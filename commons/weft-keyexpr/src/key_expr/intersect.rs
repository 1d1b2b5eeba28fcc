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
use crate::{DOUBLE_WILD, SINGLE_WILD};

// Chunk-recursive set operations over canon key expressions. Both sides may
// be wild; routing always calls these with the resource's pattern on one side
// and the addressed key on the other.

fn chunk_intersect(a: &str, b: &str) -> bool {
    a == SINGLE_WILD || b == SINGLE_WILD || a == b
}

pub(crate) fn intersect(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split('/').collect();
    let b: Vec<&str> = b.split('/').collect();
    chunks_intersect(&a, &b)
}

fn chunks_intersect(a: &[&str], b: &[&str]) -> bool {
    match (a.first(), b.first()) {
        (None, None) => true,
        (None, Some(_)) => b.iter().all(|c| *c == DOUBLE_WILD),
        (Some(_), None) => a.iter().all(|c| *c == DOUBLE_WILD),
        (Some(&DOUBLE_WILD), _) => chunks_intersect(&a[1..], b) || chunks_intersect(a, &b[1..]),
        (_, Some(&DOUBLE_WILD)) => chunks_intersect(a, &b[1..]) || chunks_intersect(&a[1..], b),
        (Some(x), Some(y)) => chunk_intersect(x, y) && chunks_intersect(&a[1..], &b[1..]),
    }
}

pub(crate) fn includes(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split('/').collect();
    let b: Vec<&str> = b.split('/').collect();
    chunks_include(&a, &b)
}

fn chunks_include(a: &[&str], b: &[&str]) -> bool {
    match (a.first(), b.first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some(_), None) => a.iter().all(|c| *c == DOUBLE_WILD),
        (Some(&DOUBLE_WILD), _) => chunks_include(&a[1..], b) || chunks_include(a, &b[1..]),
        (_, Some(&DOUBLE_WILD)) => false,
        (Some(x), Some(y)) => {
            (*x == SINGLE_WILD || x == y) && chunks_include(&a[1..], &b[1..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_intersection() {
        assert!(intersect("a/b/c", "a/b/c"));
        assert!(!intersect("a/b/c", "a/b"));
        assert!(!intersect("a/b/c", "a/b/d"));
    }

    #[test]
    fn single_wild_intersection() {
        assert!(intersect("a/*/c", "a/b/c"));
        assert!(intersect("*", "a"));
        assert!(!intersect("*", "a/b"));
        assert!(intersect("a/*", "*/b"));
        assert!(!intersect("a/*/c", "a/b"));
    }

    #[test]
    fn double_wild_intersection() {
        assert!(intersect("**", "a/b/c"));
        assert!(intersect("a/**", "a"));
        assert!(intersect("a/**/c", "a/c"));
        assert!(intersect("a/**/c", "a/b/x/c"));
        assert!(!intersect("a/**/c", "a/b/x/d"));
        assert!(intersect("a/**", "a/b/**"));
        assert!(intersect("*/**", "a"));
        assert!(!intersect("b/**", "a/b/c"));
    }

    #[test]
    fn inclusion() {
        assert!(includes("a/**", "a/b/c"));
        assert!(includes("a/*/**", "a/b/**"));
        assert!(includes("**", "a/*/c"));
        assert!(includes("a/*/c", "a/b/c"));
        assert!(!includes("a/b/c", "a/*/c"));
        assert!(!includes("a/*", "a/**"));
        assert!(includes("a/**", "a"));
        assert!(!includes("a/b", "a"));
    }
}
