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

//! Item expander: applies an `@(type->transform*[, 'sep'])` capture's
//! transform chain to a list of `(current_include, base_item)` pairs and,
//! if a separator is present, joins the result into a single string
//! (SPEC_FULL.md §4.6).

use std::cell::RefCell;
use std::collections::HashSet;

use project_eval_common::{ElementLocation, EvalError, EvalResult, ResourceKey};
use project_eval_expr::{
    scan_once, ConstructKind, ScanOutcome, TransformCapture, BUILTIN_METADATA_NAMES as BUILTIN_MODIFIER_NAMES,
};

use crate::external::FileSystem;
use crate::item::{Item, ItemLike};

/// One element of the list the transform chain operates on: the item's
/// *current include* (the text transforms rewrite), paired with the base
/// item transforms read metadata from. `current_include: None` together
/// with `base_item: Some(_)` is the "null placeholder" some functions keep
/// when `include_null_entries` is requested, to preserve correlation with
/// the base list.
#[derive(Debug, Clone)]
pub struct Pair {
    pub current_include: Option<String>,
    pub base_item: Option<Item>,
}

impl Pair {
    pub fn new(current_include: impl Into<String>, base_item: Item) -> Self {
        Pair {
            current_include: Some(current_include.into()),
            base_item: Some(base_item),
        }
    }

    fn text(&self) -> &str {
        self.current_include.as_deref().unwrap_or("")
    }
}

thread_local! {
    static TEMPLATE_SCRATCH: RefCell<String> = RefCell::new(String::new());
    static LAST_SINGLE_NAME_TEMPLATE: RefCell<Option<(String, String)>> = RefCell::new(None);
}

/// Substitutes every `%(name)` in `template` against `pair`'s base item:
/// built-in item-spec modifiers first, then custom metadata. Qualified
/// references (`%(Type.Name)`) are rejected -- disallowed inside a
/// transform's quoted body per SPEC_FULL.md §4.4/§4.6.
pub fn substitute_quoted_template(
    template: &str,
    pair: &Pair,
    location: &ElementLocation,
) -> EvalResult<String> {
    if !template.contains("%(") {
        return Ok(template.to_string());
    }

    // Fast path: exactly one match spanning the whole template.
    if let ScanOutcome::Found(c) = scan_once(template, 0) {
        if c.kind == ConstructKind::Metadata && c.start == 0 && c.end == template.len() {
            let cached = LAST_SINGLE_NAME_TEMPLATE.with(|cell| {
                cell.borrow()
                    .as_ref()
                    .filter(|(t, _)| t == template)
                    .map(|(_, name)| name.clone())
            });
            let name = match cached {
                Some(name) => name,
                None => {
                    let body = &template[2..template.len() - 1];
                    let name = parse_single_name(body, location)?;
                    LAST_SINGLE_NAME_TEMPLATE
                        .with(|cell| *cell.borrow_mut() = Some((template.to_string(), name.clone())));
                    name
                }
            };
            return resolve_one(&name, pair);
        }
    }

    TEMPLATE_SCRATCH.with(|cell| {
        let mut buf = cell.borrow_mut();
        buf.clear();
        let mut pos = 0usize;
        loop {
            match scan_once(template, pos) {
                ScanOutcome::None => {
                    buf.push_str(&template[pos..]);
                    break;
                }
                ScanOutcome::Unterminated { kind, .. } if kind == ConstructKind::Metadata => {
                    return Err(EvalError::invalid_project(
                        ResourceKey::UnterminatedExpression,
                        "unterminated metadata reference in transform template",
                        location.clone(),
                    ));
                }
                ScanOutcome::Unterminated { .. } => {
                    buf.push_str(&template[pos..]);
                    break;
                }
                ScanOutcome::Found(c) if c.kind == ConstructKind::Metadata => {
                    buf.push_str(&template[pos..c.start]);
                    let body = &template[c.start + 2..c.end - 1];
                    let name = parse_single_name(body, location)?;
                    buf.push_str(&resolve_one(&name, pair)?);
                    pos = c.end;
                }
                ScanOutcome::Found(c) => {
                    buf.push_str(&template[pos..c.end]);
                    pos = c.end;
                }
            }
        }
        Ok(buf.clone())
    })
}

fn parse_single_name(body: &str, location: &ElementLocation) -> EvalResult<String> {
    if body.is_empty() {
        return Err(EvalError::invalid_project(
            ResourceKey::EmptyMetadataName,
            "empty metadata name in transform template",
            location.clone(),
        ));
    }
    if body.contains('.') {
        return Err(EvalError::invalid_project(
            ResourceKey::QualifiedMetadataInTransformNotAllowed,
            format!("qualified metadata '%({body})' is not allowed inside a transform"),
            location.clone(),
        ));
    }
    Ok(body.to_string())
}

fn resolve_one(name: &str, pair: &Pair) -> EvalResult<String> {
    if let Some(item) = &pair.base_item {
        if let Some(value) = builtin_modifier_value(name, item) {
            return Ok(value);
        }
        if let Some(value) = item.metadata(name) {
            return Ok(value.to_string());
        }
    }
    Ok(String::new())
}

/// Derived item-spec modifier values. Timestamps (`ModifiedTime` et al.) and
/// the defining-project family require filesystem/project context this
/// in-memory expander does not carry; they resolve to the empty string.
pub(crate) fn builtin_modifier_value(name: &str, item: &Item) -> Option<String> {
    if !BUILTIN_MODIFIER_NAMES.iter().any(|m| m.eq_ignore_ascii_case(name)) {
        return None;
    }
    let full = item.normalized_path();
    let path = std::path::Path::new(full);
    let value = if name.eq_ignore_ascii_case("FullPath") {
        full.to_string()
    } else if name.eq_ignore_ascii_case("Filename") {
        path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
    } else if name.eq_ignore_ascii_case("Extension") {
        path.extension()
            .map(|s| format!(".{}", s.to_string_lossy()))
            .unwrap_or_default()
    } else if name.eq_ignore_ascii_case("Directory") || name.eq_ignore_ascii_case("RelativeDir") {
        path.parent()
            .map(|p| {
                let s = p.to_string_lossy().replace('\\', "/");
                if s.is_empty() {
                    s
                } else {
                    format!("{s}/")
                }
            })
            .unwrap_or_default()
    } else if name.eq_ignore_ascii_case("Identity") {
        item.include().to_string()
    } else if name.eq_ignore_ascii_case("RootDir") {
        "/".to_string()
    } else {
        String::new()
    };
    Some(value)
}

fn directory_name(text: &str) -> String {
    std::path::Path::new(text)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

/// Applies one transform step to `pairs`, returning the new list.
pub fn apply_transform(
    pairs: Vec<Pair>,
    transform: &TransformCapture,
    location: &ElementLocation,
    file_system: &dyn FileSystem,
) -> EvalResult<Vec<Pair>> {
    match transform {
        TransformCapture::Quoted(template) => {
            let mut out = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let value = substitute_quoted_template(template, &pair, location)?;
                out.push(Pair {
                    current_include: Some(value),
                    base_item: pair.base_item,
                });
            }
            Ok(out)
        }
        TransformCapture::Function { name, args } => apply_function(pairs, name, args, location, file_system),
    }
}

fn apply_function(
    pairs: Vec<Pair>,
    name: &str,
    args: &[String],
    location: &ElementLocation,
    file_system: &dyn FileSystem,
) -> EvalResult<Vec<Pair>> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "count" => Ok(vec![Pair {
            current_include: Some(pairs.len().to_string()),
            base_item: None,
        }]),
        "directoryname" => Ok(pairs
            .into_iter()
            .map(|p| {
                let new_text = directory_name(p.text());
                Pair {
                    current_include: Some(new_text),
                    base_item: p.base_item,
                }
            })
            .collect()),
        "metadata" => {
            let meta_name = args.first().ok_or_else(|| {
                EvalError::invalid_project(
                    ResourceKey::InvalidItemFunctionSyntax,
                    "Metadata() requires exactly one argument",
                    location.clone(),
                )
            })?;
            let mut out = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let value = pair
                    .base_item
                    .as_ref()
                    .and_then(|item| item.metadata(meta_name))
                    .unwrap_or("")
                    .to_string();
                let base = pair.base_item;
                for piece in project_eval_expr::split_semicolon_separated(&value) {
                    out.push(Pair {
                        current_include: Some(piece),
                        base_item: base.clone(),
                    });
                }
            }
            Ok(out)
        }
        "distinctwithcase" => {
            let mut seen = HashSet::new();
            Ok(pairs
                .into_iter()
                .filter(|p| seen.insert(p.text().to_string()))
                .collect())
        }
        "distinct" => {
            let mut seen = HashSet::new();
            Ok(pairs
                .into_iter()
                .filter(|p| seen.insert(p.text().to_ascii_lowercase()))
                .collect())
        }
        "reverse" => {
            let mut v = pairs;
            v.reverse();
            Ok(v)
        }
        "anyhavemetadatavalue" => {
            let (meta_name, expected) = two_args(args, "AnyHaveMetadataValue", location)?;
            for pair in &pairs {
                if let Some(item) = &pair.base_item {
                    if item.metadata(meta_name).unwrap_or("").eq_ignore_ascii_case(expected) {
                        return Ok(vec![Pair {
                            current_include: Some("true".to_string()),
                            base_item: pair.base_item.clone(),
                        }]);
                    }
                }
            }
            Ok(vec![Pair {
                current_include: Some("false".to_string()),
                base_item: None,
            }])
        }
        "hasmetadata" => {
            let meta_name = args.first().ok_or_else(|| {
                EvalError::invalid_project(
                    ResourceKey::InvalidItemFunctionSyntax,
                    "HasMetadata() requires exactly one argument",
                    location.clone(),
                )
            })?;
            Ok(pairs
                .into_iter()
                .filter(|p| {
                    p.base_item
                        .as_ref()
                        .map(|i| !i.metadata(meta_name).unwrap_or("").is_empty())
                        .unwrap_or(false)
                })
                .collect())
        }
        "withmetadatavalue" => {
            let (meta_name, expected) = two_args(args, "WithMetadataValue", location)?;
            Ok(pairs
                .into_iter()
                .filter(|p| {
                    p.base_item
                        .as_ref()
                        .map(|i| i.metadata(meta_name).unwrap_or("").eq_ignore_ascii_case(expected))
                        .unwrap_or(false)
                })
                .collect())
        }
        "withoutmetadatavalue" => {
            let (meta_name, expected) = two_args(args, "WithoutMetadataValue", location)?;
            Ok(pairs
                .into_iter()
                .filter(|p| {
                    p.base_item
                        .as_ref()
                        .map(|i| !i.metadata(meta_name).unwrap_or("").eq_ignore_ascii_case(expected))
                        .unwrap_or(true)
                })
                .collect())
        }
        "clearmetadata" => Ok(pairs
            .into_iter()
            .map(|p| Pair {
                current_include: p.current_include,
                base_item: p.base_item.map(|i| i.without_metadata_link()),
            })
            .collect()),
        "exists" => Ok(pairs
            .into_iter()
            .filter(|p| file_system.exists(p.text()))
            .collect()),
        "combine" => {
            let suffix = args.first().ok_or_else(|| {
                EvalError::invalid_project(
                    ResourceKey::InvalidItemFunctionSyntax,
                    "Combine() requires exactly one argument",
                    location.clone(),
                )
            })?;
            Ok(pairs
                .into_iter()
                .map(|p| {
                    let joined = std::path::Path::new(p.text()).join(suffix);
                    Pair {
                        current_include: Some(joined.to_string_lossy().replace('\\', "/")),
                        base_item: p.base_item,
                    }
                })
                .collect())
        }
        "getpathsofalldirectoriesabove" => {
            let mut all: HashSet<String> = HashSet::new();
            for pair in &pairs {
                let mut current = std::path::Path::new(pair.text()).parent();
                while let Some(dir) = current {
                    let text = dir.to_string_lossy().replace('\\', "/");
                    if text.is_empty() {
                        break;
                    }
                    all.insert(text);
                    current = dir.parent();
                }
            }
            let mut sorted: Vec<String> = all.into_iter().collect();
            sorted.sort_by_key(|s| s.to_ascii_lowercase());
            Ok(sorted
                .into_iter()
                .map(|text| Pair {
                    current_include: Some(text),
                    base_item: None,
                })
                .collect())
        }
        other => {
            if BUILTIN_MODIFIER_NAMES.iter().any(|m| m.eq_ignore_ascii_case(other)) {
                return Ok(pairs
                    .into_iter()
                    .map(|p| {
                        let value = p
                            .base_item
                            .as_ref()
                            .and_then(|item| builtin_modifier_value(other, item))
                            .unwrap_or_default();
                        Pair {
                            current_include: Some(value),
                            base_item: p.base_item,
                        }
                    })
                    .collect());
            }
            Err(EvalError::invalid_project(
                ResourceKey::UnknownItemFunction,
                format!("unknown item transform function '{name}'"),
                location.clone(),
            ))
        }
    }
}

fn two_args<'a>(args: &'a [String], fn_name: &str, location: &ElementLocation) -> EvalResult<(&'a str, &'a str)> {
    if args.len() != 2 {
        return Err(EvalError::invalid_project(
            ResourceKey::InvalidItemFunctionSyntax,
            format!("{fn_name}() requires exactly two arguments"),
            location.clone(),
        ));
    }
    Ok((args[0].as_str(), args[1].as_str()))
}

/// Applies the separator, if any, joining the current-include strings.
pub fn join_with_separator(pairs: &[Pair], separator: Option<&str>) -> String {
    let sep = separator.unwrap_or(";");
    pairs
        .iter()
        .filter_map(|p| p.current_include.as_deref())
        .collect::<Vec<_>>()
        .join(sep)
}
