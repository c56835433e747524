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

//! `Remove` (SPEC_FULL.md §4.7.2): drops items matching its spec from the
//! list. Its glob fragments also feed the operation list's backward
//! propagation (`operation_list::evaluate_prefix`) so an earlier `Include`
//! can skip producing items this `Remove` will throw away regardless.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use project_eval_common::{escape, ElementLocation, EvalResult};

use crate::item::Item;
use crate::item_spec::{Fragment, ItemSpec};
use crate::operation_list::ItemListRef;
use crate::ordered_items::OrderedItemBuilder;

use super::{evaluate_item_expression_texts, matches_fragments, matches_metadata_fragments, Collaborators};

pub struct RemoveOperation {
    item_type: String,
    project_directory: Arc<Path>,
    spec: ItemSpec,
    match_on_metadata: Vec<String>,
    condition_result: bool,
    referenced_lists: HashMap<String, ItemListRef>,
    removed_globs: Vec<String>,
    location: ElementLocation,
}

impl RemoveOperation {
    pub fn new(
        item_type: impl Into<String>,
        project_directory: Arc<Path>,
        spec_text: &str,
        match_on_metadata: Vec<String>,
        condition_result: bool,
        referenced_lists: HashMap<String, ItemListRef>,
        location: ElementLocation,
    ) -> Self {
        let spec = ItemSpec::parse(spec_text);
        // Backward glob propagation only makes sense for path-based removal
        // that will actually fire; a false condition or a metadata-based
        // match contributes no globs to ignore upstream.
        let removed_globs = if condition_result && match_on_metadata.is_empty() {
            spec.fragments
                .iter()
                .filter_map(|f| match f {
                    Fragment::Glob(g) => Some(escape::unescape(g)),
                    _ => None,
                })
                .collect()
        } else {
            Vec::new()
        };
        RemoveOperation {
            item_type: item_type.into(),
            project_directory,
            spec,
            match_on_metadata,
            condition_result,
            referenced_lists,
            removed_globs,
            location,
        }
    }

    /// Construct directly from a glob list, bypassing spec-derived
    /// extraction -- used by low-level cache-behavior tests that only care
    /// about backward propagation, not about what the spec text parses to.
    pub fn for_test(spec_text: &str, globs: Vec<String>, location: ElementLocation) -> Self {
        RemoveOperation {
            item_type: "Test".to_string(),
            project_directory: Arc::from(Path::new(".")),
            spec: ItemSpec::parse(spec_text),
            match_on_metadata: Vec::new(),
            condition_result: true,
            referenced_lists: HashMap::new(),
            removed_globs: globs,
            location,
        }
    }

    pub fn removed_globs(&self) -> &[String] {
        &self.removed_globs
    }

    pub fn apply(&self, builder: &mut OrderedItemBuilder, collaborators: &Collaborators) -> EvalResult<()> {
        if !self.condition_result {
            return Ok(());
        }

        if !self.match_on_metadata.is_empty() {
            builder.retain(|item| !matches_metadata_fragments(&self.spec, &self.match_on_metadata, item));
            return Ok(());
        }

        if self.spec.is_bare_self_reference(&self.item_type) {
            builder.clear();
            return Ok(());
        }

        let (literals, globs) = super::literal_and_glob_fragments(&self.spec);
        let referenced =
            evaluate_item_expression_texts(&self.spec, &self.referenced_lists, collaborators, &self.location)?;
        let all_literal = self.spec.fragments.iter().all(|f| matches!(f, Fragment::Value(_)));

        if all_literal && builder.len() >= collaborators.evaluator_config.remove_bulk_threshold {
            let mut targets: HashSet<String> = HashSet::new();
            for literal in &literals {
                let probe = Item::new(literal.clone(), Arc::clone(&self.project_directory));
                targets.insert(probe.normalized_path().to_string());
            }
            builder.bulk_remove_by_normalized_path(&targets);
        } else {
            builder.retain(|item| !matches_fragments(item, &literals, &globs, &referenced));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemLike;
    use crate::testing::{test_collaborators, InMemoryFileSystem, MapPropertyProvider};

    fn item(include: &str) -> Item {
        Item::new(include, Arc::from(Path::new("/proj")))
    }

    fn collab(props: &MapPropertyProvider, fs: &InMemoryFileSystem) -> Collaborators<'_> {
        test_collaborators(props, fs)
    }

    #[test]
    fn false_condition_removes_nothing() {
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "a.cs",
            Vec::new(),
            false,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let mut builder = OrderedItemBuilder::new();
        builder.push(item("a.cs"));
        op.apply(&mut builder, &collab(&props, &fs)).unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn bare_self_reference_clears_everything() {
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "@(A)",
            Vec::new(),
            true,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let mut builder = OrderedItemBuilder::new();
        builder.push(item("a.cs"));
        builder.push(item("b.cs"));
        op.apply(&mut builder, &collab(&props, &fs)).unwrap();
        assert!(builder.is_empty());
    }

    #[test]
    fn literal_value_removes_matching_item_only() {
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "a.cs",
            Vec::new(),
            true,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let mut builder = OrderedItemBuilder::new();
        builder.push(item("a.cs"));
        builder.push(item("b.cs"));
        op.apply(&mut builder, &collab(&props, &fs)).unwrap();
        let includes: Vec<_> = builder.iter().map(|i| i.include().to_string()).collect();
        assert_eq!(includes, vec!["b.cs".to_string()]);
    }

    #[test]
    fn glob_removes_matching_items() {
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "*.log",
            Vec::new(),
            true,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let mut builder = OrderedItemBuilder::new();
        builder.push(item("a.log"));
        builder.push(item("b.cs"));
        op.apply(&mut builder, &collab(&props, &fs)).unwrap();
        let includes: Vec<_> = builder.iter().map(|i| i.include().to_string()).collect();
        assert_eq!(includes, vec!["b.cs".to_string()]);
    }

    #[test]
    fn bulk_strategy_matches_linear_scan_result() {
        let mut builder_bulk = OrderedItemBuilder::new();
        let mut builder_linear = OrderedItemBuilder::new();
        for i in 0..60 {
            builder_bulk.push(item(&format!("file{i}.cs")));
            builder_linear.push(item(&format!("file{i}.cs")));
        }
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "file5.cs;file10.cs",
            Vec::new(),
            true,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        op.apply(&mut builder_bulk, &collab(&props, &fs)).unwrap();
        assert_eq!(builder_bulk.len(), 58);
        assert!(!builder_bulk.iter().any(|i| i.include() == "file5.cs" || i.include() == "file10.cs"));
    }

    #[test]
    fn match_on_metadata_removes_by_value() {
        let op = RemoveOperation::new(
            "A",
            Arc::from(Path::new("/proj")),
            "skip",
            vec!["Tag".to_string()],
            true,
            HashMap::new(),
            ElementLocation::unknown(),
        );
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let mut builder = OrderedItemBuilder::new();
        builder.push(item("a.cs").with_metadata("Tag", "skip"));
        builder.push(item("b.cs").with_metadata("Tag", "keep"));
        op.apply(&mut builder, &collab(&props, &fs)).unwrap();
        let includes: Vec<_> = builder.iter().map(|i| i.include().to_string()).collect();
        assert_eq!(includes, vec!["b.cs".to_string()]);
    }
}
