// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Top-level semicolon tokenizer (SPEC_FULL.md §4.2).

use crate::scanner::{scan_once, ScanOutcome};

/// Byte spans of `$(...)`/`@(...)`/`%(...)` constructs in `text`, in order.
/// A semicolon inside one of these spans (including inside a quoted
/// transform body or separator) is not a top-level separator.
fn protected_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;
    loop {
        match scan_once(text, pos) {
            ScanOutcome::Found(c) => {
                spans.push((c.start, c.end));
                pos = c.end;
            }
            ScanOutcome::Unterminated { start, .. } => {
                // Nothing sensible to protect past an unterminated
                // construct; let the caller's expander surface the error.
                let _ = start;
                break;
            }
            ScanOutcome::None => break,
        }
    }
    spans
}

/// Splits `text` at top-level semicolons, trims each segment, and drops
/// empty segments. Segment order is preserved.
pub fn split_semicolon_separated(text: &str) -> Vec<String> {
    let spans = protected_spans(text);
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0usize;
    let mut span_idx = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if span_idx < spans.len() && spans[span_idx].0 == i {
            i = spans[span_idx].1;
            span_idx += 1;
            continue;
        }
        if bytes[i] == b';' {
            segments.push(text[start..i].trim().to_string());
            start = i + 1;
        }
        i += 1;
    }
    segments.push(text[start..].trim().to_string());
    segments.retain(|s| !s.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_list() {
        assert_eq!(
            split_semicolon_separated("a;b;c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn trims_and_drops_empty_segments() {
        assert_eq!(
            split_semicolon_separated(" a ; ; b "),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn protects_semicolon_inside_item_vector_separator() {
        let segments = split_semicolon_separated("@(A, ';'); tail");
        assert_eq!(
            segments,
            vec!["@(A, ';')".to_string(), "tail".to_string()]
        );
    }

    #[test]
    fn join_identity_on_well_formed_list() {
        let list = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let joined = list.join(";");
        assert_eq!(split_semicolon_separated(&joined), list);
    }
}
