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

//! An item-spec: the semicolon-separated, already-property-expanded text of
//! an `Include`/`Exclude`/`Remove`/`Update` attribute, split into fragments
//! (SPEC_FULL.md §4.1/§4.7).

use project_eval_common::escape;
use project_eval_expr::{split_semicolon_separated, ConstructKind, ItemVectorCapture, ScanOutcome};

/// One semicolon-separated piece of an item-spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A plain literal (no wildcard characters), still in escaped form.
    Value(String),
    /// A wildcard pattern, still in escaped form.
    Glob(String),
    /// A parsed `@(type[->transform]*[, 'sep'])` reference.
    ItemExpression(ItemVectorCapture),
}

/// A fully parsed item-spec: the ordered list of fragments plus the
/// original (post-property-expansion) text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub raw: String,
    pub fragments: Vec<Fragment>,
}

impl ItemSpec {
    pub fn parse(text: &str) -> Self {
        let fragments = split_semicolon_separated(text)
            .into_iter()
            .map(|segment| classify(&segment))
            .collect();
        ItemSpec {
            raw: text.to_string(),
            fragments,
        }
    }

    /// True when this spec is the single bare `@(SameType)` reference with
    /// no transforms and no separator -- the shortcut several operations
    /// special-case.
    pub fn is_bare_self_reference(&self, item_type: &str) -> bool {
        match self.fragments.as_slice() {
            [Fragment::ItemExpression(capture)] => {
                capture.is_bare_reference() && capture.item_type.eq_ignore_ascii_case(item_type)
            }
            _ => false,
        }
    }

    pub fn item_expression_references(&self) -> impl Iterator<Item = &ItemVectorCapture> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::ItemExpression(c) => Some(c),
            _ => None,
        })
    }
}

fn classify(segment: &str) -> Fragment {
    let bytes = segment.as_bytes();
    if bytes.starts_with(b"@(") {
        if let ScanOutcome::Found(c) = project_eval_expr::scan_once(segment, 0) {
            if c.kind == ConstructKind::ItemVector && c.start == 0 && c.end == segment.len() {
                let body = &segment[2..segment.len() - 1];
                if let Some(capture) = project_eval_expr::scanner::parse_item_vector_body(body) {
                    return Fragment::ItemExpression(capture);
                }
            }
        }
    }
    if escape::has_wildcards(segment) {
        Fragment::Glob(segment.to_string())
    } else {
        Fragment::Value(segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_value_glob_and_item_expression() {
        let spec = ItemSpec::parse("a.cs;*.log;@(B)");
        assert_eq!(
            spec.fragments,
            vec![
                Fragment::Value("a.cs".to_string()),
                Fragment::Glob("*.log".to_string()),
                Fragment::ItemExpression(ItemVectorCapture {
                    item_type: "B".to_string(),
                    transforms: vec![],
                    separator: None,
                }),
            ]
        );
    }

    #[test]
    fn detects_bare_self_reference() {
        let spec = ItemSpec::parse("@(A)");
        assert!(spec.is_bare_self_reference("A"));
        assert!(!spec.is_bare_self_reference("B"));

        let not_bare = ItemSpec::parse("@(A->Distinct())");
        assert!(!not_bare.is_bare_self_reference("A"));
    }

    #[test]
    fn empty_spec_has_no_fragments() {
        let spec = ItemSpec::parse("");
        assert!(spec.fragments.is_empty());
    }
}
