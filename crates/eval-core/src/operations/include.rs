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

//! `Include` (SPEC_FULL.md §4.7.1): produces items from literal values,
//! globs (via the filesystem collaborator) and `@(Type)` references, minus
//! whatever `Exclude` and the inherited glob ignore-set rule out, then
//! decorates each with the element's metadata.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use project_eval_common::{escape, ElementLocation, EvalResult};

use crate::globs::GlobSet;
use crate::item::{Item, ItemLike};
use crate::item_expander::{apply_transform, join_with_separator, Pair};
use crate::item_spec::{Fragment, ItemSpec};
use crate::operation_list::ItemListRef;
use crate::ordered_items::OrderedItemBuilder;
use crate::wildcard::wildcard_match;

use super::{decorate_metadata, evaluate_item_expression_texts, Collaborators};

pub struct IncludeOperation {
    item_type: String,
    project_directory: Arc<Path>,
    spec: ItemSpec,
    exclude: Option<ItemSpec>,
    metadata: Vec<(String, String)>,
    condition_result: bool,
    referenced_lists: HashMap<String, ItemListRef>,
    location: ElementLocation,
}

impl IncludeOperation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        item_type: impl Into<String>,
        project_directory: Arc<Path>,
        spec_text: &str,
        exclude_text: Option<&str>,
        metadata: Vec<(String, String)>,
        condition_result: bool,
        referenced_lists: HashMap<String, ItemListRef>,
        location: ElementLocation,
    ) -> Self {
        IncludeOperation {
            item_type: item_type.into(),
            project_directory,
            spec: ItemSpec::parse(spec_text),
            exclude: exclude_text.map(ItemSpec::parse),
            metadata,
            condition_result,
            referenced_lists,
            location,
        }
    }

    pub fn apply(
        &self,
        builder: &mut OrderedItemBuilder,
        globs_to_ignore: &GlobSet,
        collaborators: &Collaborators,
    ) -> EvalResult<()> {
        // Safety rule: a false condition means this Include contributes
        // nothing, so skip even constructing the exclude set -- in
        // particular, never drive a filesystem glob scan for an Include
        // that can't produce anything.
        if !self.condition_result {
            return Ok(());
        }

        let (exclude_literals, exclude_globs) = match &self.exclude {
            Some(spec) => {
                let (mut literals, globs) = super::literal_and_glob_fragments(spec);
                literals.extend(evaluate_item_expression_texts(
                    spec,
                    &self.referenced_lists,
                    collaborators,
                    &self.location,
                )?);
                (literals, globs)
            }
            None => (Vec::new(), Vec::new()),
        };
        // Normalize each exclude literal against the project root once, up
        // front, so the per-item exclusion test below is a single hash
        // lookup (SPEC_FULL.md §4.7.1) rather than a linear scan of raw text.
        let exclude_literals: HashSet<String> = exclude_literals
            .iter()
            .map(|l| {
                collaborators
                    .item_factory
                    .create(l, &self.project_directory)
                    .normalized_path()
                    .to_ascii_lowercase()
            })
            .collect();
        let is_excluded = |item: &Item| -> bool {
            if exclude_literals.contains(&item.normalized_path().to_ascii_lowercase()) {
                return true;
            }
            exclude_globs
                .iter()
                .any(|g| wildcard_match(g, item.include()) || wildcard_match(g, item.normalized_path()))
        };

        let mut fs_excludes: Vec<String> = globs_to_ignore.globs().to_vec();
        fs_excludes.extend(exclude_globs.iter().cloned());

        for fragment in &self.spec.fragments {
            match fragment {
                Fragment::Value(v) => {
                    let text = escape::unescape(v);
                    let item = collaborators.item_factory.create(&text, &self.project_directory);
                    if is_excluded(&item) {
                        continue;
                    }
                    self.push_decorated(builder, item, collaborators)?;
                }
                Fragment::Glob(g) => {
                    let pattern = escape::unescape(g);
                    let matched =
                        collaborators
                            .file_system
                            .enumerate(&self.project_directory, &pattern, &fs_excludes)?;
                    for path in matched {
                        let item = collaborators
                            .item_factory
                            .create_from_glob(&path, &pattern, &self.project_directory);
                        if is_excluded(&item) {
                            continue;
                        }
                        self.push_decorated(builder, item, collaborators)?;
                    }
                }
                Fragment::ItemExpression(capture) => {
                    let list_ref = match self.referenced_lists.get(&capture.item_type) {
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
                        pairs = apply_transform(pairs, transform, &self.location, collaborators.file_system)?;
                    }
                    if let Some(sep) = &capture.separator {
                        let joined = join_with_separator(&pairs, Some(sep));
                        let item = collaborators.item_factory.create(&joined, &self.project_directory);
                        if !is_excluded(&item) {
                            self.push_decorated(builder, item, collaborators)?;
                        }
                    } else {
                        for pair in &pairs {
                            let text = match &pair.current_include {
                                Some(text) => text,
                                None => continue,
                            };
                            let item = collaborators.item_factory.create(text, &self.project_directory);
                            if is_excluded(&item) {
                                continue;
                            }
                            self.push_decorated(builder, item, collaborators)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn push_decorated(
        &self,
        builder: &mut OrderedItemBuilder,
        item: Item,
        collaborators: &Collaborators,
    ) -> EvalResult<()> {
        let decorated = decorate_metadata(
            item,
            &self.item_type,
            &self.metadata,
            &HashMap::new(),
            &self.location,
            collaborators,
        )?;
        builder.push(decorated);
        Ok(())
    }
}
