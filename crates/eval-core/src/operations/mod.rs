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

//! The three item operations (SPEC_FULL.md §4.7): `Include`, `Remove`,
//! `Update`. Each shares the same `apply(builder, globs_to_ignore)`
//! interface; only `Include` actually consults `globs_to_ignore`.

pub mod include;
pub mod remove;
pub mod update;

pub use include::IncludeOperation;
pub use remove::RemoveOperation;
pub use update::UpdateOperation;

use std::collections::{HashMap, HashSet};

use project_eval_common::{escape, DiagnosticSink, ElementLocation, EvalResult};
use project_eval_expr::{
    EvaluatorConfig, ExpanderOptions, MetadataTableLike, PropertyFunctionEvaluator, PropertyProvider,
};

use crate::external::{FileSystem, ItemFactory};
use crate::globs::GlobSet;
use crate::item::{Item, ItemLike};
use crate::item_expander::Pair;
use crate::item_spec::{Fragment, ItemSpec};
use crate::operation_list::ItemListRef;
use crate::ordered_items::OrderedItemBuilder;
use crate::wildcard::wildcard_match;

/// The collaborators every operation needs to apply itself: everything an
/// `Include`'s glob expansion, an `Update`'s metadata decoration, or a
/// `Remove`'s `Exists` check might call into.
pub struct Collaborators<'a> {
    pub properties: &'a dyn PropertyProvider,
    pub functions: &'a dyn PropertyFunctionEvaluator,
    pub file_system: &'a dyn FileSystem,
    pub item_factory: &'a dyn ItemFactory,
    pub diagnostics: &'a dyn DiagnosticSink,
    pub expander_options: ExpanderOptions,
    pub evaluator_config: EvaluatorConfig,
}

/// One operation in an item type's source-ordered operation list.
pub enum Operation {
    Include(IncludeOperation),
    Remove(RemoveOperation),
    Update(UpdateOperation),
}

impl Operation {
    pub fn apply(
        &self,
        builder: &mut OrderedItemBuilder,
        globs_to_ignore: &GlobSet,
        collaborators: &Collaborators,
    ) -> EvalResult<()> {
        match self {
            Operation::Include(op) => op.apply(builder, globs_to_ignore, collaborators),
            Operation::Remove(op) => op.apply(builder, collaborators),
            Operation::Update(op) => op.apply(builder, collaborators),
        }
    }
}

/// A metadata table over a single item, optionally able to resolve
/// qualified references to *other* item types via a captured-items map
/// (`Update`'s hybrid matcher, SPEC_FULL.md §4.7.3). `Include` and the
/// common case of `Update` pass an empty map.
pub struct ItemSelfMetadataTable<'a> {
    pub item_type: &'a str,
    pub item: &'a Item,
    pub captured: &'a HashMap<String, Item>,
}

impl<'a> MetadataTableLike for ItemSelfMetadataTable<'a> {
    fn escaped_value(&self, item_type: Option<&str>, name: &str) -> String {
        let builtin = crate::item_expander::builtin_modifier_value(name, self.item);
        if let Some(value) = builtin {
            return project_eval_common::escape::escape(&value);
        }
        match item_type {
            None => self.item.metadata(name).unwrap_or("").to_string(),
            Some(qualifier) if qualifier.eq_ignore_ascii_case(self.item_type) => {
                self.item.metadata(name).unwrap_or("").to_string()
            }
            Some(qualifier) => self
                .captured
                .get(qualifier)
                .and_then(|other| other.metadata(name))
                .unwrap_or("")
                .to_string(),
        }
    }

    fn item_type(&self) -> Option<&str> {
        Some(self.item_type)
    }
}

/// Expands and assigns `assignments` (in declaration order) onto `item`,
/// producing a new, decorated `Item`. Each assignment's value expression is
/// first property-expanded, then metadata-expanded against the item's
/// *own*, so-far-assigned metadata -- so a later metadata element can
/// reference an earlier one by name.
pub fn decorate_metadata(
    mut item: Item,
    item_type: &str,
    assignments: &[(String, String)],
    captured: &HashMap<String, Item>,
    location: &ElementLocation,
    collaborators: &Collaborators,
) -> EvalResult<Item> {
    for (name, raw_value) in assignments {
        let table = ItemSelfMetadataTable {
            item_type,
            item: &item,
            captured,
        };
        let after_properties = {
            let mut uses = project_eval_expr::PropertiesUseTracker::new();
            project_eval_expr::expand_properties(
                raw_value,
                collaborators.properties,
                collaborators.functions,
                &collaborators.expander_options,
                location,
                &mut uses,
            )?
            .map(|expanded| expanded.into_escaped_string())
            .unwrap_or_default()
        };
        let value = project_eval_expr::expand_metadata(
            &after_properties,
            &table,
            &collaborators.expander_options,
            location,
            collaborators.diagnostics,
        )?;
        item = item.with_metadata(name.clone(), value);
    }
    Ok(item)
}

/// Splits a spec's fragments into (unescaped literals, unescaped globs),
/// dropping any item-expression fragments -- callers that care about those
/// use [`evaluate_item_expression_texts`] separately.
pub(crate) fn literal_and_glob_fragments(spec: &ItemSpec) -> (Vec<String>, Vec<String>) {
    let mut literals = Vec::new();
    let mut globs = Vec::new();
    for fragment in &spec.fragments {
        match fragment {
            Fragment::Value(v) => literals.push(escape::unescape(v)),
            Fragment::Glob(g) => globs.push(escape::unescape(g)),
            Fragment::ItemExpression(_) => {}
        }
    }
    (literals, globs)
}

/// Evaluates every `@(Type[->transform]*)` fragment referenced by `spec`
/// against its captured list, applying the transform chain, and returns the
/// union of resulting text values. A fragment whose type was never captured
/// (not referenced at construction time) is silently skipped.
pub(crate) fn evaluate_item_expression_texts(
    spec: &ItemSpec,
    referenced_lists: &HashMap<String, ItemListRef>,
    collaborators: &Collaborators,
    location: &ElementLocation,
) -> EvalResult<HashSet<String>> {
    let mut out = HashSet::new();
    for capture in spec.item_expression_references() {
        let list_ref = match referenced_lists.get(&capture.item_type) {
            Some(r) => r,
            None => continue,
        };
        let snapshot = list_ref.evaluate(collaborators)?;
        let mut pairs: Vec<Pair> = snapshot
            .items()
            .iter()
            .map(|item| Pair::new(item.include().to_string(), item.clone()))
            .collect();
        for transform in &capture.transforms {
            pairs = crate::item_expander::apply_transform(pairs, transform, location, collaborators.file_system)?;
        }
        for pair in &pairs {
            if let Some(text) = &pair.current_include {
                out.insert(text.clone());
            }
        }
    }
    Ok(out)
}

/// Path-based match test shared by `Remove` and `Update`'s default (non
/// metadata-based) matcher: a literal fragment, a glob fragment, or a
/// captured item-expression's resulting text, checked against both the
/// item's raw include and its normalized path.
pub(crate) fn matches_fragments(
    item: &Item,
    literals: &[String],
    globs: &[String],
    referenced_includes: &HashSet<String>,
) -> bool {
    let include = item.include();
    let normalized = item.normalized_path();
    if literals
        .iter()
        .any(|l| l.eq_ignore_ascii_case(include) || l.eq_ignore_ascii_case(normalized))
    {
        return true;
    }
    if globs
        .iter()
        .any(|g| wildcard_match(g, include) || wildcard_match(g, normalized))
    {
        return true;
    }
    referenced_includes.contains(include) || referenced_includes.contains(normalized)
}

/// `MatchOnMetadata`-based match test shared by `Remove` and `Update`. Only
/// the first metadata name is honored -- matching on a composite tuple of
/// several metadata names is not implemented (see DESIGN.md).
pub(crate) fn matches_metadata_fragments(spec: &ItemSpec, match_on_metadata: &[String], item: &Item) -> bool {
    let name = match match_on_metadata.first() {
        Some(n) => n,
        None => return false,
    };
    let value = item.metadata(name).unwrap_or("");
    spec.fragments.iter().any(|fragment| match fragment {
        Fragment::Value(v) => escape::unescape(v).eq_ignore_ascii_case(value),
        Fragment::Glob(g) => wildcard_match(&escape::unescape(g), value),
        Fragment::ItemExpression(_) => false,
    })
}
