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

//! Names-and-metadata collector (SPEC_FULL.md §4.3 point 2): gathers the set
//! of referenced item-type names and the set of metadata references that lie
//! outside a transform's quoted body, without fully expanding anything.
//! Used by callers that need to know which item types and metadata an
//! expression depends on before any item data is available (e.g. to build a
//! dependency-ordered evaluation plan).

use std::collections::{HashMap, HashSet};

use crate::scanner::{
    item_vector_separator_span, parse_metadata_body, scan_once, ConstructKind, ScanOutcome,
};

/// Result of [`collect_names_and_metadata`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectedNames {
    pub item_types: HashSet<String>,
    /// Keyed by [`crate::capture::MetadataCapture::key`]; value is
    /// `(optional item-type qualifier, metadata name)`.
    pub metadata: HashMap<String, (Option<String>, String)>,
}

impl CollectedNames {
    fn record_metadata_body(&mut self, body: &str) {
        if let Some(capture) = parse_metadata_body(body) {
            self.metadata
                .insert(capture.key(), (capture.item_type.clone(), capture.name));
        }
    }

    fn scan_for_metadata(&mut self, text: &str) {
        let mut pos = 0usize;
        loop {
            match scan_once(text, pos) {
                ScanOutcome::None | ScanOutcome::Unterminated { .. } => break,
                ScanOutcome::Found(c) if c.kind == ConstructKind::Metadata => {
                    self.record_metadata_body(&text[c.start + 2..c.end - 1]);
                    pos = c.end;
                }
                ScanOutcome::Found(c) => pos = c.end,
            }
        }
    }
}

/// Walks `text`, collecting the set of item-type names referenced by any
/// `@(...)` capture, and the set of `%(...)` metadata references that lie
/// outside a transform's quoted body (i.e. at top level, or inside an item
/// vector's separator).
pub fn collect_names_and_metadata(text: &str) -> CollectedNames {
    let mut result = CollectedNames::default();
    let mut pos = 0usize;
    loop {
        match scan_once(text, pos) {
            ScanOutcome::None | ScanOutcome::Unterminated { .. } => break,
            ScanOutcome::Found(c) if c.kind == ConstructKind::Metadata => {
                result.record_metadata_body(&text[c.start + 2..c.end - 1]);
                pos = c.end;
            }
            ScanOutcome::Found(c) if c.kind == ConstructKind::ItemVector => {
                let body = &text[c.start + 2..c.end - 1];
                if let Some(capture) = crate::scanner::parse_item_vector_body(body) {
                    result.item_types.insert(capture.item_type);
                }
                if let Some((sep_start, sep_end)) = item_vector_separator_span(body) {
                    result.scan_for_metadata(&body[sep_start..sep_end]);
                }
                pos = c.end;
            }
            ScanOutcome::Found(c) => pos = c.end,
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_item_type_and_top_level_metadata() {
        let collected = collect_names_and_metadata("%(Tag) @(Compile)");
        assert!(collected.item_types.contains("Compile"));
        assert!(collected.metadata.contains_key("Tag"));
    }

    #[test]
    fn excludes_metadata_inside_transform_body() {
        let collected = collect_names_and_metadata("@(Compile->'%(Hidden)')");
        assert!(collected.item_types.contains("Compile"));
        assert!(!collected.metadata.contains_key("Hidden"));
    }

    #[test]
    fn includes_metadata_inside_separator() {
        let collected = collect_names_and_metadata("@(Compile, '%(Visible)')");
        assert!(collected.metadata.contains_key("Visible"));
    }

    #[test]
    fn qualified_metadata_keyed_by_item_type_dot_name() {
        let collected = collect_names_and_metadata("%(Compile.Tag)");
        assert!(collected.metadata.contains_key("Compile.Tag"));
        let (item_type, name) = &collected.metadata["Compile.Tag"];
        assert_eq!(item_type.as_deref(), Some("Compile"));
        assert_eq!(name, "Tag");
    }
}
