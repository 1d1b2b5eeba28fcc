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

/// Types whose key-expression canon form can be computed in place.
///
/// Canonization rewrites wildcard runs so that set-equal expressions are
/// string-equal: `**/**` becomes `**`, and any `*` in a run of wildcards is
/// moved in front of the `**` (`**/*` becomes `*/**`).
pub trait Canonize {
    fn canonize(&mut self);
}

fn canon(s: &str) -> Option<String> {
    if !s.contains("**") {
        return None;
    }
    let mut out: Vec<&str> = Vec::new();
    let mut run_start: Option<usize> = None;
    for chunk in s.split('/') {
        let wild = chunk == SINGLE_WILD || chunk == DOUBLE_WILD;
        match (wild, run_start) {
            (true, None) => {
                run_start = Some(out.len());
                out.push(chunk);
            }
            (true, Some(start)) => {
                // Keep the run sorted: all "*" first, one "**" last.
                if chunk == SINGLE_WILD {
                    let insert_at = out[start..]
                        .iter()
                        .position(|c| *c == DOUBLE_WILD)
                        .map(|p| start + p)
                        .unwrap_or(out.len());
                    out.insert(insert_at, chunk);
                } else if out.last() != Some(&DOUBLE_WILD) {
                    out.push(chunk);
                }
            }
            (false, _) => {
                run_start = None;
                out.push(chunk);
            }
        }
    }
    let joined = out.join("/");
    (joined != s).then_some(joined)
}

impl Canonize for String {
    fn canonize(&mut self) {
        if let Some(canon) = canon(self) {
            *self = canon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonized(s: &str) -> String {
        let mut s = s.to_string();
        s.canonize();
        s
    }

    #[test]
    fn canon_rewrites_wild_runs() {
        assert_eq!(canonized("**/**"), "**");
        assert_eq!(canonized("**/*"), "*/**");
        assert_eq!(canonized("a/**/**/b"), "a/**/b");
        assert_eq!(canonized("a/**/*/**"), "a/*/**");
        assert_eq!(canonized("**/*/**/*"), "*/*/**");
    }

    #[test]
    fn canon_keeps_canon_forms() {
        for s in ["a/b/c", "*/**", "a/*/c", "**", "a/*/**"] {
            assert_eq!(canonized(s), s);
        }
    }
}
