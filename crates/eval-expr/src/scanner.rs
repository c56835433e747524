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

//! Hand-written character scanner for the three embedded-reference forms:
//! `$(...)` properties, `@(...)` item vectors, and `%(...)` metadata.
//!
//! This replaces a regex-driven scanner by design (see SPEC_FULL.md REDESIGN
//! FLAG R1): the grammar is regular and small, and a manual scan avoids both
//! backtracking and the per-match allocation a regex engine would incur.

use crate::capture::{ItemVectorCapture, MetadataCapture, PropertyCapture, TransformCapture};

/// Which of the three embedded-reference forms a [`Construct`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructKind {
    Property,
    ItemVector,
    Metadata,
}

/// A raw, unparsed span for one of the three forms: `[start, end)` covers
/// the whole reference including its sigil (`$`/`@`/`%`) and parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Construct {
    pub kind: ConstructKind,
    pub start: usize,
    pub end: usize,
}

/// Result of scanning for the next construct starting at a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(Construct),
    /// A sigil + `(` was found but no matching `)` exists before the end of
    /// the string.
    Unterminated { kind: ConstructKind, start: usize },
    /// No more sigils from `from` onward.
    None,
}

/// Finds the end (exclusive) of the parenthesized region that opens at
/// `open_paren_idx` (which must point at a `(` byte), accounting for nested
/// parens and for single-quoted regions in which parens don't count.
///
/// Returns the byte index of the matching `)`.
pub fn scan_balanced(bytes: &[u8], open_paren_idx: usize) -> Option<usize> {
    debug_assert_eq!(bytes.get(open_paren_idx), Some(&b'('));
    let mut depth: i32 = 1;
    let mut i = open_paren_idx + 1;
    let mut in_quote = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Scans `text` for the next `$(`, `@(`, or `%(` occurrence at or after
/// `from`, and resolves its matching close paren.
pub fn scan_once(text: &str, from: usize) -> ScanOutcome {
    let bytes = text.as_bytes();
    let candidates = [
        ("$(", ConstructKind::Property),
        ("@(", ConstructKind::ItemVector),
        ("%(", ConstructKind::Metadata),
    ];
    let mut best: Option<(usize, ConstructKind)> = None;
    for (pat, kind) in candidates {
        if let Some(rel) = text.get(from..).and_then(|s| s.find(pat)) {
            let idx = from + rel;
            let better = match best {
                Some((b, _)) => idx < b,
                None => true,
            };
            if better {
                best = Some((idx, kind));
            }
        }
    }
    let Some((start, kind)) = best else {
        return ScanOutcome::None;
    };
    let open_paren = start + 1;
    match scan_balanced(bytes, open_paren) {
        Some(close) => ScanOutcome::Found(Construct {
            kind,
            start,
            end: close + 1,
        }),
        None => ScanOutcome::Unterminated { kind, start },
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Splits `args` on top-level commas (not inside `'...'` or nested parens),
/// trims each piece, and strips one layer of surrounding single quotes.
pub fn split_top_level_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => depth -= 1,
            b',' if !in_quote && depth == 0 => {
                parts.push(strip_quotes(args[start..i].trim()));
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(strip_quotes(args[start..].trim()));
    parts
}

fn strip_quotes(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Reads a single-quoted literal starting at `body[i]` (which must be `'`).
/// Returns `(content, index_after_closing_quote)`.
fn read_quoted(body: &str, i: usize) -> Option<(String, usize)> {
    debug_assert_eq!(body.as_bytes().get(i), Some(&b'\''));
    let rest = &body[i + 1..];
    let close_rel = rest.find('\'')?;
    Some((rest[..close_rel].to_string(), i + 1 + close_rel + 1))
}

/// Parses the item-type name and the chain of `->transform` steps starting
/// at byte 0 of `body`. Returns `(item_type, transforms, index_after_last_
/// transform)`, where the returned index is where a trailing `, 'sep'`
/// separator (if any) would begin. Shared by [`parse_item_vector_body`] and
/// [`item_vector_separator_span`] so both agree on exactly how much of the
/// body the name/transform chain consumes.
fn parse_item_vector_prefix(body: &str) -> Option<(String, Vec<TransformCapture>, usize)> {
    let bytes = body.as_bytes();
    let mut i = 0usize;
    let name_start = i;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'-' && bytes.get(i + 1) == Some(&b'>') {
            break;
        }
        if b == b',' {
            break;
        }
        if !is_name_byte(b) {
            break;
        }
        i += 1;
    }
    let item_type = body[name_start..i].trim().to_string();
    if item_type.is_empty() {
        return None;
    }

    let mut transforms = Vec::new();
    loop {
        while bytes.get(i) == Some(&b' ') {
            i += 1;
        }
        if body[i..].starts_with("->") {
            i += 2;
            while bytes.get(i) == Some(&b' ') {
                i += 1;
            }
            if bytes.get(i) == Some(&b'\'') {
                let (content, next) = read_quoted(body, i)?;
                transforms.push(TransformCapture::Quoted(content));
                i = next;
            } else {
                let fname_start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let fname = body[fname_start..i].to_string();
                if fname.is_empty() || bytes.get(i) != Some(&b'(') {
                    return None;
                }
                let close = scan_balanced(bytes, i)?;
                let args = split_top_level_args(&body[i + 1..close]);
                transforms.push(TransformCapture::Function { name: fname, args });
                i = close + 1;
            }
        } else {
            break;
        }
    }

    Some((item_type, transforms, i))
}

/// Parses the content between `@(` and `)` (exclusive of both) into an
/// [`ItemVectorCapture`]. Returns `None` on malformed input.
pub fn parse_item_vector_body(body: &str) -> Option<ItemVectorCapture> {
    let (item_type, transforms, mut i) = parse_item_vector_prefix(body)?;
    let bytes = body.as_bytes();

    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    let mut separator = None;
    if bytes.get(i) == Some(&b',') {
        i += 1;
        while bytes.get(i) == Some(&b' ') {
            i += 1;
        }
        if bytes.get(i) != Some(&b'\'') {
            return None;
        }
        let (content, next) = read_quoted(body, i)?;
        separator = Some(content);
        i = next;
    }

    if !body[i..].trim().is_empty() {
        return None;
    }

    Some(ItemVectorCapture {
        item_type,
        transforms,
        separator,
    })
}

/// Returns the byte span (relative to `body`) of the separator's quoted
/// *content*, i.e. excluding the surrounding `'` characters, if `body` (the
/// interior of an `@(...)` construct) has a trailing `, '...'` separator.
/// Used by the metadata expander, which must rewrite only the separator
/// portion of an item vector and leave the name/transform chain untouched
/// for the item expander to parse later (SPEC_FULL.md §4.4).
pub fn item_vector_separator_span(body: &str) -> Option<(usize, usize)> {
    let (_, _, mut i) = parse_item_vector_prefix(body)?;
    let bytes = body.as_bytes();
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) != Some(&b',') {
        return None;
    }
    i += 1;
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'\'') {
        return None;
    }
    let content_start = i + 1;
    let rest = &body[content_start..];
    let close_rel = rest.find('\'')?;
    Some((content_start, content_start + close_rel))
}

/// Parses the content between `%(` and `)` into a [`MetadataCapture`].
pub fn parse_metadata_body(body: &str) -> Option<MetadataCapture> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find('.') {
        Some(dot) => {
            let item_type = &trimmed[..dot];
            let name = &trimmed[dot + 1..];
            if item_type.is_empty() || name.is_empty() {
                return None;
            }
            Some(MetadataCapture {
                item_type: Some(item_type.to_string()),
                name: name.to_string(),
            })
        }
        None => Some(MetadataCapture {
            item_type: None,
            name: trimmed.to_string(),
        }),
    }
}

/// Parses the content between `$(` and `)` into a [`PropertyCapture`].
///
/// Property function invocation is an external collaborator (see
/// SPEC_FULL.md §4.5); this only splits the raw pieces apart.
pub fn parse_property_body(body: &str) -> PropertyCapture {
    let trimmed = body.trim();
    if let Some(dot) = trimmed.find('.') {
        let name = &trimmed[..dot];
        let rest = trimmed[dot + 1..].trim();
        if let Some(paren) = rest.find('(') {
            let method = rest[..paren].trim();
            let bytes = rest.as_bytes();
            if !method.is_empty() && bytes.get(paren) == Some(&b'(') {
                if let Some(close) = scan_balanced(bytes, paren) {
                    if close == bytes.len() - 1 {
                        return PropertyCapture {
                            name: name.to_string(),
                            function: Some((method.to_string(), rest[paren + 1..close].to_string())),
                        };
                    }
                }
            }
        }
    }
    PropertyCapture {
        name: trimmed.to_string(),
        function: None,
    }
}

/// Yields each `@(...)` item-vector capture in `text`, in order, alongside
/// its byte span. Non-item-vector constructs (`$(...)`, `%(...)`) found
/// along the way are skipped over, not yielded -- this is the
/// "item-expression enumerator" of SPEC_FULL.md §4.3.
pub struct ItemExpressionEnumerator<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ItemExpressionEnumerator<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for ItemExpressionEnumerator<'a> {
    type Item = (usize, usize, ItemVectorCapture);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match scan_once(self.text, self.pos) {
                ScanOutcome::None => return None,
                ScanOutcome::Unterminated { .. } => return None,
                ScanOutcome::Found(c) if c.kind != ConstructKind::ItemVector => {
                    self.pos = c.end;
                }
                ScanOutcome::Found(c) => {
                    let body = &self.text[c.start + 2..c.end - 1];
                    self.pos = c.end;
                    if let Some(capture) = parse_item_vector_body(body) {
                        return Some((c.start, c.end, capture));
                    }
                    // malformed capture: skip it and keep scanning
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_simple_property() {
        match scan_once("x $(Foo) y", 0) {
            ScanOutcome::Found(c) => {
                assert_eq!(c.kind, ConstructKind::Property);
                assert_eq!(&"x $(Foo) y"[c.start..c.end], "$(Foo)");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scans_nested_function_call() {
        let text = "$(Foo.Bar(Baz('a,b')))";
        match scan_once(text, 0) {
            ScanOutcome::Found(c) => assert_eq!(&text[c.start..c.end], text),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detects_unterminated() {
        match scan_once("$(Foo", 0) {
            ScanOutcome::Unterminated { kind, start } => {
                assert_eq!(kind, ConstructKind::Property);
                assert_eq!(start, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn item_vector_bare() {
        let cap = parse_item_vector_body("A").unwrap();
        assert_eq!(cap.item_type, "A");
        assert!(cap.is_bare_reference());
    }

    #[test]
    fn item_vector_name_with_dash() {
        let cap = parse_item_vector_body("My-Items").unwrap();
        assert_eq!(cap.item_type, "My-Items");
    }

    #[test]
    fn item_vector_quoted_transform() {
        let cap = parse_item_vector_body("A->'%(Tag)-%(Filename)'").unwrap();
        assert_eq!(cap.item_type, "A");
        assert_eq!(
            cap.transforms,
            vec![TransformCapture::Quoted("%(Tag)-%(Filename)".to_string())]
        );
    }

    #[test]
    fn item_vector_function_transform_with_args() {
        let cap = parse_item_vector_body("A->WithMetadataValue('Tag','T1')").unwrap();
        assert_eq!(
            cap.transforms,
            vec![TransformCapture::Function {
                name: "WithMetadataValue".to_string(),
                args: vec!["Tag".to_string(), "T1".to_string()],
            }]
        );
    }

    #[test]
    fn item_vector_chained_transforms_and_separator() {
        let cap = parse_item_vector_body("A->Distinct()->Reverse(), ';'").unwrap();
        assert_eq!(cap.transforms.len(), 2);
        assert_eq!(cap.separator.as_deref(), Some(";"));
    }

    #[test]
    fn item_vector_separator_with_semicolon() {
        let cap = parse_item_vector_body("A, ';'").unwrap();
        assert_eq!(cap.separator.as_deref(), Some(";"));
        assert!(cap.transforms.is_empty());
    }

    #[test]
    fn metadata_unqualified() {
        let cap = parse_metadata_body("Tag").unwrap();
        assert_eq!(cap.item_type, None);
        assert_eq!(cap.name, "Tag");
    }

    #[test]
    fn metadata_qualified() {
        let cap = parse_metadata_body("Compile.Tag").unwrap();
        assert_eq!(cap.item_type.as_deref(), Some("Compile"));
        assert_eq!(cap.name, "Tag");
    }

    #[test]
    fn metadata_empty_name_is_malformed() {
        assert!(parse_metadata_body("").is_none());
        assert!(parse_metadata_body("Compile.").is_none());
    }

    #[test]
    fn enumerator_yields_only_item_vectors_in_order() {
        let text = "$(Foo) @(A) mid %(Bar) @(B->Distinct())";
        let found: Vec<_> = ItemExpressionEnumerator::new(text)
            .map(|(_, _, c)| c.item_type)
            .collect();
        assert_eq!(found, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn property_with_method_call() {
        let cap = parse_property_body("Foo.Method(1, 2)");
        assert_eq!(cap.name, "Foo");
        assert_eq!(
            cap.function,
            Some(("Method".to_string(), "1, 2".to_string()))
        );
    }

    #[test]
    fn property_plain_name() {
        let cap = parse_property_body("Foo");
        assert_eq!(cap.name, "Foo");
        assert_eq!(cap.function, None);
    }

    #[test]
    fn separator_span_locates_quoted_content() {
        let body = "A->Distinct(), '%(Tag);'";
        let (start, end) = item_vector_separator_span(body).unwrap();
        assert_eq!(&body[start..end], "%(Tag);");
    }

    #[test]
    fn separator_span_none_without_separator() {
        assert!(item_vector_separator_span("A->Distinct()").is_none());
        assert!(item_vector_separator_span("A").is_none());
    }

    #[test]
    fn separator_span_agrees_with_full_parse() {
        let body = "A, 'x%(Meta)y'";
        let cap = parse_item_vector_body(body).unwrap();
        let (start, end) = item_vector_separator_span(body).unwrap();
        assert_eq!(&body[start..end], cap.separator.as_deref().unwrap());
    }
}
