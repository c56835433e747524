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

//! Expander configuration. Plain, `Copy` option structs in the teacher's
//! direct struct-literal style (e.g. `OptimizerConfig`) rather than a
//! builder -- the field count is small and fixed.

/// Options threaded through the metadata and property expanders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderOptions {
    /// Whether `@(...)` item-vector references are expanded at all, or left
    /// as literal text (used when expanding a context that has no item
    /// scope, e.g. a global property).
    pub expand_item_vectors: bool,
    /// Whether non-`Include`d (i.e. filesystem-sourced via lazy wildcard
    /// evaluation) items participate in expansion.
    pub use_non_metadata_items: bool,
    /// Truncate any single metadata-value substitution longer than 1024
    /// characters to its first 1021 characters plus `...`.
    pub truncate: bool,
    /// Emit a low-importance diagnostic when an item's metadata table is
    /// asked to resolve a reference qualified with (or implicitly matching)
    /// its own item type.
    pub log_on_item_metadata_self_reference: bool,
    /// Expand references to the fixed set of built-in metadata names
    /// (`FullPath`, `RootDir`, ...). When `false`, such references are left
    /// as literal text.
    pub expand_built_in_metadata: bool,
    /// Expand references to custom (non-built-in) metadata names. When
    /// `false`, such references are left as literal text.
    pub expand_custom_metadata: bool,
    /// Property expansion: stop as soon as partial expansion yields
    /// non-empty output, signalling the caller to treat the whole
    /// expression as non-empty without finishing substitution.
    pub break_on_not_empty: bool,
    /// Suppress property-function invocation errors, leaving the literal
    /// `$(...)` reference in place instead of failing evaluation.
    pub leave_properties_unexpanded_on_error: bool,
}

impl Default for ExpanderOptions {
    fn default() -> Self {
        ExpanderOptions {
            expand_item_vectors: true,
            use_non_metadata_items: true,
            truncate: true,
            log_on_item_metadata_self_reference: true,
            expand_built_in_metadata: true,
            expand_custom_metadata: true,
            break_on_not_empty: false,
            leave_properties_unexpanded_on_error: false,
        }
    }
}

/// Evaluator-wide tuning, orthogonal to a single expansion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// When set, an item's "current include" is re-expanded against the
    /// project directory as a glob rather than trusted verbatim.
    pub lazy_wildcard_evaluation: bool,
    /// Item count above which `Remove` uses the dictionary-based bulk
    /// strategy (§4.7.2) instead of a linear scan per candidate. `50` is a
    /// round number above which the dictionary's setup cost amortizes,
    /// mirroring the `large_futures` threshold the teacher tunes in its own
    /// workspace lints.
    pub remove_bulk_threshold: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            lazy_wildcard_evaluation: false,
            remove_bulk_threshold: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expander_defaults_match_spec() {
        let o = ExpanderOptions::default();
        assert!(o.expand_item_vectors);
        assert!(o.truncate);
        assert!(!o.break_on_not_empty);
    }

    #[test]
    fn evaluator_config_default_threshold_is_fifty() {
        assert_eq!(EvaluatorConfig::default().remove_bulk_threshold, 50);
    }
}
