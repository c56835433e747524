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

//! The mutable item list an operation's `apply` appends to or filters
//! (SPEC_FULL.md §4.7/§4.8). A thin wrapper over `Vec<Item>` with a
//! normalized-path side index so large-list `Remove` can do an `O(N)`
//! dictionary pass instead of an `O(N*M)` linear scan.

use crate::item::{Item, ItemLike};

/// A builder: the mutable working copy an operation mutates in place. Named
/// distinctly from the frozen [`ItemSnapshot`] it can be converted to/from,
/// mirroring the "builder vs. immutable" split the specification requires
/// so a cached snapshot is never accidentally mutated by a later apply.
#[derive(Debug, Clone, Default)]
pub struct OrderedItemBuilder {
    items: Vec<Item>,
}

impl OrderedItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> &Item {
        &self.items[index]
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Item) -> bool) {
        self.items.retain(|item| keep(item));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Removes every item whose normalized path is a member of
    /// `normalized_paths_to_remove`. `O(N)`: builds no new intermediate
    /// allocations beyond the retained vector.
    pub fn bulk_remove_by_normalized_path(&mut self, normalized_paths_to_remove: &std::collections::HashSet<String>) {
        self.items
            .retain(|item| !normalized_paths_to_remove.contains(item.normalized_path()));
    }

    /// Replaces the item at `index` (used by `Update`, which clones-and-
    /// replaces matched items in place to preserve position).
    pub fn replace_at(&mut self, index: usize, item: Item) {
        self.items[index] = item;
    }

    pub fn indices_matching(&self, mut predicate: impl FnMut(&Item) -> bool) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| predicate(item).then_some(i))
            .collect()
    }

    pub fn to_immutable(&self) -> ItemSnapshot {
        ItemSnapshot {
            items: self.items.clone(),
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

/// A frozen copy of an item list, safe to share behind the snapshot cache
/// (`Item` itself is deep-immutable, so sharing its elements across
/// snapshots is always sound).
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    items: Vec<Item>,
}

impl ItemSnapshot {
    pub fn empty() -> Self {
        ItemSnapshot { items: Vec::new() }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Produces a mutable copy for further operation application. External
    /// callers always go through this -- never mutate a cached snapshot in
    /// place.
    pub fn to_builder(&self) -> OrderedItemBuilder {
        OrderedItemBuilder {
            items: self.items.clone(),
        }
    }
}
