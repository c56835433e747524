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

//! Property expander: replaces `$(...)` references (SPEC_FULL.md §4.5).

use std::collections::HashSet;

use project_eval_common::{escape, ElementLocation, EvalResult};

use crate::options::ExpanderOptions;
use crate::providers::{BindingHints, PropertyFunctionEvaluator, PropertyProvider, PropertyValue};
use crate::scanner::{parse_property_body, scan_once, split_top_level_args, ConstructKind, ScanOutcome};

/// Records the names of properties that were actually referenced during an
/// expansion pass, so a later redefinition of one of them can be diagnosed.
#[derive(Debug, Default, Clone)]
pub struct PropertiesUseTracker {
    referenced: HashSet<String>,
}

impl PropertiesUseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str) {
        self.referenced.insert(name.to_string());
    }

    pub fn was_referenced(&self, name: &str) -> bool {
        self.referenced.contains(name)
    }
}

/// The result of a property-expansion pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandedProperty {
    /// The stringified, escaped expansion ("leave escaped" mode) -- the
    /// common case, and always the outcome for expressions containing more
    /// than a single bare property reference.
    Str(String),
    /// The raw typed value of a single whole-expression property-function
    /// call ("leave typed" mode).
    Typed(PropertyValue),
}

impl ExpandedProperty {
    pub fn into_escaped_string(self) -> String {
        match self {
            ExpandedProperty::Str(s) => s,
            ExpandedProperty::Typed(v) => v.to_escaped_string(),
        }
    }
}

fn lookup_escaped(provider: &dyn PropertyProvider, name: &str, uses: &mut PropertiesUseTracker) -> String {
    uses.record(name);
    provider.lookup(name).unwrap_or_default()
}

/// Expands every `$(...)` reference in `text`. Returns `Ok(None)` when
/// `options.break_on_not_empty` triggers an early exit after encountering
/// non-empty partial output, per the external-interface contract's "return
/// null to signal early exit" behavior.
pub fn expand_properties(
    text: &str,
    provider: &dyn PropertyProvider,
    functions: &dyn PropertyFunctionEvaluator,
    options: &ExpanderOptions,
    location: &ElementLocation,
    uses: &mut PropertiesUseTracker,
) -> EvalResult<Option<ExpandedProperty>> {
    if !text.contains("$(") {
        return Ok(Some(ExpandedProperty::Str(text.to_string())));
    }

    // "Leave typed": the whole expression is a single `$(...)` construct
    // that is itself a function call.
    if let ScanOutcome::Found(c) = scan_once(text, 0) {
        if c.kind == ConstructKind::Property && c.start == 0 && c.end == text.len() {
            let body = &text[2..text.len() - 1];
            let capture = parse_property_body(body);
            if let Some((method, raw_args)) = &capture.function {
                uses.record(&capture.name);
                let receiver_value = provider.lookup(&capture.name);
                let args = split_top_level_args(raw_args);
                let invoked = functions.invoke(
                    "Property",
                    receiver_value.as_deref(),
                    method,
                    &args,
                    BindingHints::default(),
                );
                match invoked {
                    Ok(value) => return Ok(Some(ExpandedProperty::Typed(value))),
                    Err(e) if options.leave_properties_unexpanded_on_error => {
                        let _ = e;
                        return Ok(Some(ExpandedProperty::Str(text.to_string())));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0usize;
    loop {
        match scan_once(text, pos) {
            ScanOutcome::None => {
                out.push_str(&text[pos..]);
                break;
            }
            ScanOutcome::Unterminated { kind, .. } if kind == ConstructKind::Property => {
                return Err(project_eval_common::EvalError::invalid_project(
                    project_eval_common::ResourceKey::UnterminatedExpression,
                    "unterminated property reference",
                    location.clone(),
                ));
            }
            ScanOutcome::Unterminated { .. } => {
                out.push_str(&text[pos..]);
                break;
            }
            ScanOutcome::Found(c) if c.kind == ConstructKind::Property => {
                out.push_str(&text[pos..c.start]);
                let body = &text[c.start + 2..c.end - 1];
                let capture = parse_property_body(body);
                let escaped = match &capture.function {
                    Some((method, raw_args)) => {
                        uses.record(&capture.name);
                        let receiver_value = provider.lookup(&capture.name);
                        let args = split_top_level_args(raw_args);
                        let invoked = functions.invoke(
                            "Property",
                            receiver_value.as_deref(),
                            method,
                            &args,
                            BindingHints::default(),
                        );
                        match invoked {
                            Ok(value) => value.to_escaped_string(),
                            Err(_) if options.leave_properties_unexpanded_on_error => {
                                text[c.start..c.end].to_string()
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    None => escape::escape(&lookup_escaped(provider, &capture.name, uses)),
                };
                out.push_str(&escaped);
                pos = c.end;

                if options.break_on_not_empty && !out.trim().is_empty() {
                    return Ok(None);
                }
            }
            ScanOutcome::Found(c) => {
                // `@(...)`/`%(...)`: not this expander's concern.
                out.push_str(&text[pos..c.end]);
                pos = c.end;
            }
        }
    }

    Ok(Some(ExpandedProperty::Str(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::NoPropertyFunctions;
    use project_eval_common::{EvalError, ResourceKey};
    use std::collections::HashMap;

    struct MapProvider(HashMap<String, String>);

    impl PropertyProvider for MapProvider {
        fn lookup(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }

        fn enumerate(&self) -> Vec<(String, String)> {
            self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
    }

    fn provider(pairs: &[(&str, &str)]) -> MapProvider {
        MapProvider(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn returns_input_unchanged_when_no_properties() {
        let p = provider(&[]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let out = expand_properties(
            "plain",
            &p,
            &NoPropertyFunctions,
            &ExpanderOptions::default(),
            &loc,
            &mut uses,
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, ExpandedProperty::Str("plain".to_string()));
    }

    #[test]
    fn replaces_simple_property_and_records_use() {
        let p = provider(&[("Foo", "bar")]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let out = expand_properties(
            "x=$(Foo)",
            &p,
            &NoPropertyFunctions,
            &ExpanderOptions::default(),
            &loc,
            &mut uses,
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, ExpandedProperty::Str("x=bar".to_string()));
        assert!(uses.was_referenced("Foo"));
    }

    #[test]
    fn undefined_property_expands_to_empty_string() {
        let p = provider(&[]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let out = expand_properties(
            "[$(Missing)]",
            &p,
            &NoPropertyFunctions,
            &ExpanderOptions::default(),
            &loc,
            &mut uses,
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, ExpandedProperty::Str("[]".to_string()));
    }

    #[test]
    fn break_on_not_empty_signals_early_exit() {
        let p = provider(&[("Foo", "bar")]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let mut options = ExpanderOptions::default();
        options.break_on_not_empty = true;
        let out = expand_properties(
            "$(Foo)$(Baz)",
            &p,
            &NoPropertyFunctions,
            &options,
            &loc,
            &mut uses,
        )
        .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn unknown_function_errors_without_suppression() {
        let p = provider(&[("Foo", "bar")]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let err = expand_properties(
            "$(Foo.ToUpper())",
            &p,
            &NoPropertyFunctions,
            &ExpanderOptions::default(),
            &loc,
            &mut uses,
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InvalidProject { resource_key, .. } if resource_key == ResourceKey::UnknownItemFunction));
    }

    #[test]
    fn suppressed_function_error_leaves_literal() {
        let p = provider(&[("Foo", "bar")]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let mut options = ExpanderOptions::default();
        options.leave_properties_unexpanded_on_error = true;
        let out = expand_properties(
            "$(Foo.ToUpper())",
            &p,
            &NoPropertyFunctions,
            &options,
            &loc,
            &mut uses,
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, ExpandedProperty::Str("$(Foo.ToUpper())".to_string()));
    }

    #[test]
    fn unterminated_reference_is_an_error() {
        let p = provider(&[]);
        let mut uses = PropertiesUseTracker::new();
        let loc = ElementLocation::unknown();
        let err = expand_properties(
            "$(Foo",
            &p,
            &NoPropertyFunctions,
            &ExpanderOptions::default(),
            &loc,
            &mut uses,
        )
        .unwrap_err();
        assert_eq!(err.resource_key(), ResourceKey::UnterminatedExpression);
    }
}
