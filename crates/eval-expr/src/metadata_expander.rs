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

//! Metadata expander: replaces `%(name)` / `%(item.name)` references with
//! their escaped values (SPEC_FULL.md §4.4).

use project_eval_common::{
    DiagnosticSink, ElementLocation, EvalError, EvalResult, Importance, ResourceKey,
};

use crate::options::ExpanderOptions;
use crate::providers::{is_builtin_metadata_name, MetadataTableLike};
use crate::scanner::{
    item_vector_separator_span, parse_metadata_body, scan_once, ConstructKind, ScanOutcome,
};

const TRUNCATE_LIMIT: usize = 1024;
const TRUNCATE_KEEP: usize = 1021;

fn truncated(value: String, truncate: bool) -> String {
    if truncate && value.len() > TRUNCATE_LIMIT {
        let mut s = String::with_capacity(TRUNCATE_KEEP + 3);
        // `value` is already escaped ASCII-safe text (percent-encoding keeps
        // everything in the ASCII range), so byte truncation never splits a
        // UTF-8 sequence.
        s.push_str(&value[..TRUNCATE_KEEP]);
        s.push_str("...");
        s
    } else {
        value
    }
}

fn expand_one_reference(
    body: &str,
    table: &dyn MetadataTableLike,
    options: &ExpanderOptions,
    location: &ElementLocation,
    sink: &dyn DiagnosticSink,
) -> EvalResult<Option<String>> {
    let capture = parse_metadata_body(body).ok_or_else(|| {
        EvalError::invalid_project(
            ResourceKey::EmptyMetadataName,
            format!("malformed metadata reference '%({body})'"),
            location.clone(),
        )
    })?;

    let is_builtin = is_builtin_metadata_name(&capture.name);
    if is_builtin && !options.expand_built_in_metadata {
        return Ok(None);
    }
    if !is_builtin && !options.expand_custom_metadata {
        return Ok(None);
    }

    if options.log_on_item_metadata_self_reference {
        let self_referencing = match (&capture.item_type, table.item_type()) {
            (Some(qualifier), Some(own)) => qualifier.eq_ignore_ascii_case(own),
            (None, Some(_)) => true,
            _ => false,
        };
        if self_referencing {
            sink.log_comment(
                Importance::Low,
                location,
                "ItemReferencingSelfInTarget",
                format_args!("metadata reference '%({body})' resolves against its own item"),
            );
        }
    }

    let value = table.escaped_value(capture.item_type.as_deref(), &capture.name);
    Ok(Some(truncated(value, options.truncate)))
}

/// Expands every `%(...)` reference in `text` using `table`, replacing
/// in-scope metadata with its escaped value. Item-vector captures (`@(...)`)
/// are copied through verbatim except for their separator, inside which
/// metadata is still expanded -- the transform body is resolved later by the
/// item expander, per-item. Returns the original `text` (no allocation)
/// when nothing changed.
pub fn expand_metadata(
    text: &str,
    table: &dyn MetadataTableLike,
    options: &ExpanderOptions,
    location: &ElementLocation,
    sink: &dyn DiagnosticSink,
) -> EvalResult<String> {
    if !text.contains("%(") {
        return Ok(text.to_string());
    }

    if !text.contains("@(") {
        return expand_direct(text, table, options, location, sink);
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0usize;
    loop {
        match scan_once(text, pos) {
            ScanOutcome::None => {
                out.push_str(&text[pos..]);
                break;
            }
            ScanOutcome::Unterminated { kind, start } => {
                if kind == ConstructKind::Metadata {
                    return Err(EvalError::invalid_project(
                        ResourceKey::UnterminatedExpression,
                        "unterminated metadata reference",
                        location.clone(),
                    ));
                }
                out.push_str(&text[pos..]);
                let _ = start;
                break;
            }
            ScanOutcome::Found(c) if c.kind == ConstructKind::Metadata => {
                out.push_str(&text[pos..c.start]);
                let body = &text[c.start + 2..c.end - 1];
                match expand_one_reference(body, table, options, location, sink)? {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&text[c.start..c.end]),
                }
                pos = c.end;
            }
            ScanOutcome::Found(c) if c.kind == ConstructKind::ItemVector => {
                out.push_str(&text[pos..c.start]);
                let body = &text[c.start + 2..c.end - 1];
                out.push_str("@(");
                if let Some((sep_start, sep_end)) = item_vector_separator_span(body) {
                    out.push_str(&body[..sep_start]);
                    let sep_content =
                        expand_direct(&body[sep_start..sep_end], table, options, location, sink)?;
                    out.push_str(&sep_content);
                    out.push_str(&body[sep_end..]);
                } else {
                    out.push_str(body);
                }
                out.push(')');
                pos = c.end;
            }
            ScanOutcome::Found(c) => {
                // `$(...)`: left for the property expander.
                out.push_str(&text[pos..c.end]);
                pos = c.end;
            }
        }
    }

    if out == text {
        Ok(text.to_string())
    } else {
        Ok(out)
    }
}

fn expand_direct(
    text: &str,
    table: &dyn MetadataTableLike,
    options: &ExpanderOptions,
    location: &ElementLocation,
    sink: &dyn DiagnosticSink,
) -> EvalResult<String> {
    if !text.contains("%(") {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut pos = 0usize;
    loop {
        match scan_once(text, pos) {
            ScanOutcome::None => {
                out.push_str(&text[pos..]);
                break;
            }
            ScanOutcome::Unterminated { kind, .. } if kind == ConstructKind::Metadata => {
                return Err(EvalError::invalid_project(
                    ResourceKey::UnterminatedExpression,
                    "unterminated metadata reference",
                    location.clone(),
                ));
            }
            ScanOutcome::Unterminated { .. } => {
                out.push_str(&text[pos..]);
                break;
            }
            ScanOutcome::Found(c) if c.kind == ConstructKind::Metadata => {
                out.push_str(&text[pos..c.start]);
                let body = &text[c.start + 2..c.end - 1];
                match expand_one_reference(body, table, options, location, sink)? {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&text[c.start..c.end]),
                }
                pos = c.end;
            }
            ScanOutcome::Found(c) => {
                out.push_str(&text[pos..c.end]);
                pos = c.end;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use project_eval_common::NullDiagnosticSink;
    use std::collections::HashMap;

    struct MapTable {
        values: HashMap<String, String>,
        item_type: Option<String>,
    }

    impl MetadataTableLike for MapTable {
        fn escaped_value(&self, item_type: Option<&str>, name: &str) -> String {
            let key = match item_type {
                Some(t) => format!("{t}.{name}"),
                None => name.to_string(),
            };
            self.values
                .get(&key)
                .or_else(|| self.values.get(name))
                .cloned()
                .unwrap_or_default()
        }

        fn item_type(&self) -> Option<&str> {
            self.item_type.as_deref()
        }
    }

    fn table(pairs: &[(&str, &str)]) -> MapTable {
        MapTable {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            item_type: None,
        }
    }

    #[test]
    fn returns_input_unchanged_when_no_metadata() {
        let t = table(&[]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let out = expand_metadata("plain text", &t, &ExpanderOptions::default(), &loc, &sink)
            .unwrap();
        assert_eq!(out, "plain text");
    }

    #[test]
    fn replaces_simple_metadata() {
        let t = table(&[("Tag", "hello")]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let out = expand_metadata("x=%(Tag)", &t, &ExpanderOptions::default(), &loc, &sink)
            .unwrap();
        assert_eq!(out, "x=hello");
    }

    #[test]
    fn leaves_item_vector_transform_body_untouched() {
        let t = table(&[("Tag", "hello")]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let out = expand_metadata(
            "@(A->'%(Tag)')",
            &t,
            &ExpanderOptions::default(),
            &loc,
            &sink,
        )
        .unwrap();
        assert_eq!(out, "@(A->'%(Tag)')");
    }

    #[test]
    fn expands_separator_metadata_inside_item_vector() {
        let t = table(&[("Tag", ";")]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let out = expand_metadata(
            "@(A, '%(Tag)') more %(Tag)",
            &t,
            &ExpanderOptions::default(),
            &loc,
            &sink,
        )
        .unwrap();
        assert_eq!(out, "@(A, ';') more ;");
    }

    #[test]
    fn truncates_long_values() {
        let long = "x".repeat(2000);
        let t = table(&[("Tag", long.as_str())]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let out = expand_metadata("%(Tag)", &t, &ExpanderOptions::default(), &loc, &sink)
            .unwrap();
        assert_eq!(out.len(), TRUNCATE_KEEP + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn disabled_custom_metadata_left_literal() {
        let t = table(&[("Custom", "value")]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let mut options = ExpanderOptions::default();
        options.expand_custom_metadata = false;
        let out = expand_metadata("%(Custom)", &t, &options, &loc, &sink).unwrap();
        assert_eq!(out, "%(Custom)");
    }

    #[test]
    fn unterminated_reference_is_an_error() {
        let t = table(&[]);
        let loc = ElementLocation::unknown();
        let sink = NullDiagnosticSink;
        let err = expand_metadata("%(Tag", &t, &ExpanderOptions::default(), &loc, &sink)
            .unwrap_err();
        assert_eq!(err.resource_key(), ResourceKey::UnterminatedExpression);
    }
}
