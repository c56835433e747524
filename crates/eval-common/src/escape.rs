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

//! Escaping for characters that are meaningful to the expression grammar.
//!
//! Every string that crosses the evaluator boundary is explicitly either
//! *escaped* (reserved characters encoded as `%XX`) or *unescaped*. The two
//! forms are distinct types at the call-site level (plain `String`, but
//! functions are named so the two can never be silently mixed up).

/// Characters that must be percent-encoded when a raw string is escaped.
const RESERVED: &[u8] = b"%*?;$@()'\"";

fn is_reserved(byte: u8) -> bool {
    RESERVED.contains(&byte)
}

/// Encodes every reserved character in `unescaped` as `%XX` (uppercase hex).
///
/// `escape(unescape(s)) == s` whenever `s` contains no stray `%` that isn't
/// part of a valid `%XX` triplet.
pub fn escape(unescaped: &str) -> String {
    let mut out = String::with_capacity(unescaped.len());
    for byte in unescaped.bytes() {
        if is_reserved(byte) {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        } else {
            // Reserved characters are all ASCII, so pushing raw bytes for
            // the non-reserved case one at a time keeps UTF-8 boundaries
            // intact as long as we only special-case ASCII bytes above.
            out.push(byte as char);
        }
    }
    out
}

/// Decodes `%XX` triplets in `escaped` back to raw characters.
///
/// A `%` not followed by two valid hex digits is passed through literally
/// (this keeps `unescape` total rather than fallible, matching the
/// evaluator's convention of never failing on malformed escapes at this
/// layer -- only the expression scanner validates syntax).
///
/// `unescape(escape(s)) == s` for any `s`.
pub fn unescape(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            if let Some(value) = hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    // SAFETY-free path: escaped text only ever widens ASCII reserved
    // characters, so byte-level surgery on a valid UTF-8 input followed by
    // `from_utf8_lossy` cannot introduce corruption for any string this
    // evaluator produces itself; inputs from outside are still checked.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = hex_digit(hi?)?;
    let lo = hex_digit(lo?)?;
    Some((hi << 4) | lo)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// True if `s` contains any of the wildcard characters `*`, `?`.
///
/// Used to classify an item-spec fragment or an exclude pattern as a glob
/// vs. a literal value. `**` is just two consecutive `*`s here; directory
/// recursion semantics live in the glob-matching collaborator, not here.
pub fn has_wildcards(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_identity() {
        let samples = [
            "plain",
            "has % percent",
            "a;b;c",
            "$(Foo)",
            "@(Bar)",
            "%(Baz)",
            "quote'd \"text\"",
            "",
        ];
        for s in samples {
            assert_eq!(unescape(&escape(s)), s, "round trip failed for {s:?}");
        }
    }

    #[test]
    fn escape_encodes_reserved_chars() {
        assert_eq!(escape("a;b"), "a%3Bb");
        assert_eq!(escape("$(x)"), "%24%28x%29");
    }

    #[test]
    fn unescape_passes_through_stray_percent() {
        assert_eq!(unescape("100% done"), "100% done");
        assert_eq!(unescape("%zz"), "%zz");
    }

    #[test]
    fn unescape_decodes_known_escapes() {
        assert_eq!(unescape("a%3Bb"), "a;b");
        assert_eq!(unescape("%24%28x%29"), "$(x)");
    }

    #[test]
    fn wildcard_detection() {
        assert!(has_wildcards("*.cs"));
        assert!(has_wildcards("a?.txt"));
        assert!(!has_wildcards("plain.txt"));
    }
}
