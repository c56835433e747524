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

//! The evaluator façade (SPEC_FULL.md §4.9): ingests elements in source
//! order, builds each item type's `OperationList`, capturing `ItemListRef`s
//! for every type an element mentions, and at query time flattens every
//! type's fully-evaluated list into one item sequence.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use project_eval_common::{ElementLocation, EvalResult};
use project_eval_expr::collect_names_and_metadata;

use crate::globs::GlobSet;
use crate::item::Item;
use crate::operation_list::{ItemListRef, OperationList, SharedOperationList};
use crate::operations::{Collaborators, IncludeOperation, Operation, RemoveOperation, UpdateOperation};

/// One source-ordered element: an `Include`, `Remove` or `Update` directed
/// at `item_type`, plus the metadata assignments and pre-evaluated condition
/// result the façade's caller is responsible for producing (condition
/// parsing and property-only item-spec expansion happen upstream of this
/// crate, against the property expander in `project-eval-expr`).
pub struct ItemElement {
    pub item_type: String,
    pub kind: ElementKind,
    pub metadata: Vec<(String, String)>,
    pub condition_result: bool,
    pub location: ElementLocation,
}

pub enum ElementKind {
    Include { spec: String, exclude: Option<String> },
    Remove { spec: String, match_on_metadata: Vec<String> },
    Update { spec: String, match_on_metadata: Vec<String> },
}

/// Ingests [`ItemElement`]s and produces the final, flattened item list.
///
/// Cross-type ordering simplification: items are grouped by type in
/// first-seen order rather than interleaved at exact per-item source
/// position. Within one type, source order is exact (`OperationList`
/// applies that type's own operations strictly in the order they were
/// added). See DESIGN.md.
pub struct Evaluator {
    project_directory: Arc<Path>,
    lists: IndexMap<String, SharedOperationList>,
}

impl Evaluator {
    pub fn new(project_directory: impl Into<Arc<Path>>) -> Self {
        Evaluator {
            project_directory: project_directory.into(),
            lists: IndexMap::new(),
        }
    }

    fn list_for(&mut self, item_type: &str) -> SharedOperationList {
        if let Some(existing) = self.lists.get(item_type) {
            return existing.clone();
        }
        let list = OperationList::new(item_type.to_string());
        self.lists.insert(item_type.to_string(), list.clone());
        list
    }

    /// Collects every item type referenced (directly, in `Exclude`, or in
    /// `MatchOnMetadata`-adjacent metadata values) by `element`, capturing an
    /// `ItemListRef` into each one's list as of right now.
    fn capture_referenced_lists(&mut self, element: &ItemElement) -> HashMap<String, ItemListRef> {
        let mut types: HashSet<String> = HashSet::new();
        let spec_text = match &element.kind {
            ElementKind::Include { spec, exclude } => {
                if let Some(exclude) = exclude {
                    types.extend(collect_names_and_metadata(exclude).item_types);
                }
                spec
            }
            ElementKind::Remove { spec, .. } => spec,
            ElementKind::Update { spec, .. } => spec,
        };
        types.extend(collect_names_and_metadata(spec_text).item_types);
        for (_, value) in &element.metadata {
            types.extend(collect_names_and_metadata(value).item_types);
        }
        types.remove(&element.item_type);

        types
            .into_iter()
            .map(|referenced_type| {
                let list = self.list_for(&referenced_type);
                let item_list_ref = ItemListRef::capture(&list);
                (referenced_type, item_list_ref)
            })
            .collect()
    }

    /// Parses `element` into its concrete operation and appends it to its
    /// item type's list.
    pub fn add_element(&mut self, element: ItemElement) {
        let referenced_lists = self.capture_referenced_lists(&element);
        let list = self.list_for(&element.item_type);
        let operation = match &element.kind {
            ElementKind::Include { spec, exclude } => Operation::Include(IncludeOperation::new(
                element.item_type.clone(),
                Arc::clone(&self.project_directory),
                spec,
                exclude.as_deref(),
                element.metadata.clone(),
                element.condition_result,
                referenced_lists,
                element.location.clone(),
            )),
            ElementKind::Remove { spec, match_on_metadata } => Operation::Remove(RemoveOperation::new(
                element.item_type.clone(),
                Arc::clone(&self.project_directory),
                spec,
                match_on_metadata.clone(),
                element.condition_result,
                referenced_lists,
                element.location.clone(),
            )),
            ElementKind::Update { spec, match_on_metadata } => Operation::Update(UpdateOperation::new(
                element.item_type.clone(),
                spec,
                element.metadata.clone(),
                element.condition_result,
                match_on_metadata.clone(),
                referenced_lists,
                element.location.clone(),
            )),
        };
        list.borrow_mut().push(operation);
    }

    /// Evaluates every item type's list in full and returns the flattened
    /// result, grouped by type in first-referenced order.
    pub fn evaluate_all(&self, collaborators: &Collaborators) -> EvalResult<Vec<Item>> {
        let mut out = Vec::new();
        for list in self.lists.values() {
            let len = list.borrow().len();
            let snapshot = list.borrow_mut().evaluate_prefix(len, &GlobSet::empty(), collaborators)?;
            out.extend(snapshot.items().iter().cloned());
        }
        Ok(out)
    }

    /// Evaluates a single item type's list in full -- used by callers that
    /// only need one type's items (e.g. a target consuming `@(Compile)`)
    /// without paying for every other type's evaluation.
    pub fn evaluate_type(&self, item_type: &str, collaborators: &Collaborators) -> EvalResult<Vec<Item>> {
        match self.lists.get(item_type) {
            Some(list) => {
                let len = list.borrow().len();
                let snapshot = list.borrow_mut().evaluate_prefix(len, &GlobSet::empty(), collaborators)?;
                Ok(snapshot.items().to_vec())
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemLike;
    use crate::testing::{test_collaborators, InMemoryFileSystem, MapPropertyProvider};
    use std::path::PathBuf;

    fn project_dir() -> Arc<Path> {
        Arc::from(PathBuf::from("/proj").as_path())
    }

    #[test]
    fn include_then_update_applies_in_source_order() {
        let mut evaluator = Evaluator::new(project_dir());
        evaluator.add_element(ItemElement {
            item_type: "Compile".to_string(),
            kind: ElementKind::Include {
                spec: "a.cs;b.cs".to_string(),
                exclude: None,
            },
            metadata: Vec::new(),
            condition_result: true,
            location: ElementLocation::unknown(),
        });
        evaluator.add_element(ItemElement {
            item_type: "Compile".to_string(),
            kind: ElementKind::Update {
                spec: "@(Compile)".to_string(),
                match_on_metadata: Vec::new(),
            },
            metadata: vec![("Optimize".to_string(), "true".to_string())],
            condition_result: true,
            location: ElementLocation::unknown(),
        });

        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        let items = evaluator.evaluate_all(&collab).unwrap();
        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.metadata("Optimize"), Some("true"));
        }
    }

    #[test]
    fn include_then_remove_by_glob_drops_matching_items() {
        let mut evaluator = Evaluator::new(project_dir());
        evaluator.add_element(ItemElement {
            item_type: "Compile".to_string(),
            kind: ElementKind::Include {
                spec: "a.cs;a.g.cs".to_string(),
                exclude: None,
            },
            metadata: Vec::new(),
            condition_result: true,
            location: ElementLocation::unknown(),
        });
        evaluator.add_element(ItemElement {
            item_type: "Compile".to_string(),
            kind: ElementKind::Remove {
                spec: "*.g.cs".to_string(),
                match_on_metadata: Vec::new(),
            },
            metadata: Vec::new(),
            condition_result: true,
            location: ElementLocation::unknown(),
        });

        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        let items = evaluator.evaluate_type("Compile", &collab).unwrap();
        let includes: Vec<_> = items.iter().map(|i| i.include().to_string()).collect();
        assert_eq!(includes, vec!["a.cs".to_string()]);
    }

    #[test]
    fn unreferenced_type_evaluates_to_empty() {
        let evaluator = Evaluator::new(project_dir());
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        assert!(evaluator.evaluate_type("None", &collab).unwrap().is_empty());
    }

    #[test]
    fn cross_type_item_expression_reference_sees_the_captured_snapshot() {
        let mut evaluator = Evaluator::new(project_dir());
        evaluator.add_element(ItemElement {
            item_type: "Compile".to_string(),
            kind: ElementKind::Include {
                spec: "a.cs".to_string(),
                exclude: None,
            },
            metadata: Vec::new(),
            condition_result: true,
            location: ElementLocation::unknown(),
        });
        evaluator.add_element(ItemElement {
            item_type: "Backup".to_string(),
            kind: ElementKind::Include {
                spec: "@(Compile->'%(Filename).bak')".to_string(),
                exclude: None,
            },
            metadata: Vec::new(),
            condition_result: true,
            location: ElementLocation::unknown(),
        });

        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        let items = evaluator.evaluate_type("Backup", &collab).unwrap();
        let includes: Vec<_> = items.iter().map(|i| i.include().to_string()).collect();
        assert_eq!(includes, vec!["a.bak".to_string()]);
    }
}
