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

//! `Update` (SPEC_FULL.md §4.7.3): clones and re-decorates items matching
//! its spec in place, preserving position. The common "bare `@(Type)`,
//! nothing else" case is pure-text batchable -- `operation_list` applies it
//! as one `O(N)` dictionary pass rather than per-operation matching.

use std::collections::HashMap;

use project_eval_common::{ElementLocation, EvalResult};

use crate::item::{Item, ItemLike};
use crate::item_spec::ItemSpec;
use crate::operation_list::ItemListRef;
use crate::ordered_items::OrderedItemBuilder;

use super::{decorate_metadata, evaluate_item_expression_texts, matches_fragments, matches_metadata_fragments, Collaborators};

pub struct UpdateOperation {
    item_type: String,
    spec: ItemSpec,
    metadata: Vec<(String, String)>,
    condition_result: bool,
    match_on_metadata: Vec<String>,
    referenced_lists: HashMap<String, ItemListRef>,
    location: ElementLocation,
}

impl UpdateOperation {
    pub fn new(
        item_type: impl Into<String>,
        spec_text: &str,
        metadata: Vec<(String, String)>,
        condition_result: bool,
        match_on_metadata: Vec<String>,
        referenced_lists: HashMap<String, ItemListRef>,
        location: ElementLocation,
    ) -> Self {
        let item_type = item_type.into();
        let spec = ItemSpec::parse(spec_text);
        UpdateOperation {
            item_type,
            spec,
            metadata,
            condition_result,
            match_on_metadata,
            referenced_lists,
            location,
        }
    }

    /// True for the common case -- `Update Include="@(SameType)"` with no
    /// `MatchOnMetadata` and no other referenced item type -- where every
    /// item of this type is updated independently of any other item, so the
    /// whole operation can be applied as one batched dictionary pass.
    pub fn is_pure_text_batchable(&self) -> bool {
        self.condition_result
            && self.match_on_metadata.is_empty()
            && self.referenced_lists.is_empty()
            && self.spec.is_bare_self_reference(&self.item_type)
    }

    pub fn apply_batched(&self, builder: &mut OrderedItemBuilder, collaborators: &Collaborators) -> EvalResult<()> {
        if !self.condition_result {
            return Ok(());
        }
        for index in 0..builder.len() {
            let item = builder.get(index).clone();
            let decorated = decorate_metadata(
                item,
                &self.item_type,
                &self.metadata,
                &HashMap::new(),
                &self.location,
                collaborators,
            )?;
            builder.replace_at(index, decorated);
        }
        Ok(())
    }

    pub fn apply(&self, builder: &mut OrderedItemBuilder, collaborators: &Collaborators) -> EvalResult<()> {
        if !self.condition_result {
            return Ok(());
        }

        let captured_by_type = self.capture_hybrid_items(collaborators)?;

        let matches_everything = self.match_on_metadata.is_empty() && self.spec.is_bare_self_reference(&self.item_type);
        let indices: Vec<usize> = if matches_everything {
            (0..builder.len()).collect()
        } else if !self.match_on_metadata.is_empty() {
            builder.indices_matching(|item| matches_metadata_fragments(&self.spec, &self.match_on_metadata, item))
        } else {
            let (literals, globs) = super::literal_and_glob_fragments(&self.spec);
            let referenced =
                evaluate_item_expression_texts(&self.spec, &self.referenced_lists, collaborators, &self.location)?;
            builder.indices_matching(|item| matches_fragments(item, &literals, &globs, &referenced))
        };

        for index in indices {
            let item = builder.get(index).clone();
            let captured = Self::captured_for_item(&item, &captured_by_type);
            let decorated = decorate_metadata(
                item,
                &self.item_type,
                &self.metadata,
                &captured,
                &self.location,
                collaborators,
            )?;
            builder.replace_at(index, decorated);
        }
        Ok(())
    }

    /// Evaluates every item-expression fragment's referenced list once per
    /// operation, indexed by evaluated-include (and by normalized path) so a
    /// matched item can be correlated to the specific referenced item that
    /// produced its match, not merely to "the list this type evaluated to".
    fn capture_hybrid_items(&self, collaborators: &Collaborators) -> EvalResult<HashMap<String, HashMap<String, Item>>> {
        let mut by_type: HashMap<String, HashMap<String, Item>> = HashMap::new();
        for capture in self.spec.item_expression_references() {
            if by_type.contains_key(&capture.item_type) {
                continue;
            }
            if let Some(list_ref) = self.referenced_lists.get(&capture.item_type) {
                let snapshot = list_ref.evaluate(collaborators)?;
                let mut by_include = HashMap::new();
                for referenced_item in snapshot.items() {
                    by_include.insert(referenced_item.include().to_string(), referenced_item.clone());
                    by_include.insert(referenced_item.normalized_path().to_string(), referenced_item.clone());
                }
                by_type.insert(capture.item_type.clone(), by_include);
            }
        }
        Ok(by_type)
    }

    /// Picks out, for a single matched `item`, which referenced item (if
    /// any) of each captured type produced its match -- the `itemtype ->
    /// matched-item` mapping `%(OtherType.Name)` resolution consumes
    /// (SPEC_FULL.md §4.7.3 matching strategy 2). Two different referenced
    /// types that both happen to produce `item`'s include collide by plain
    /// `HashMap` insert-overwrite in iteration order (see DESIGN.md Open
    /// Question (a)).
    fn captured_for_item(item: &Item, by_type: &HashMap<String, HashMap<String, Item>>) -> HashMap<String, Item> {
        let mut captured = HashMap::new();
        for (item_type, by_include) in by_type {
            let matched = by_include
                .get(item.include())
                .or_else(|| by_include.get(item.normalized_path()));
            if let Some(matched) = matched {
                captured.insert(item_type.clone(), matched.clone());
            }
        }
        captured
    }
}
