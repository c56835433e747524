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

//! The operation list and its snapshot cache -- "the crown jewel"
//! (SPEC_FULL.md §4.8). For a given item type, the list of `Include`/
//! `Remove`/`Update` operations in source order is evaluated up to a
//! *visible count* `k` against an inherited *globs-to-ignore* set `G`.
//!
//! The two-phase algorithm:
//! - **Backward scan** (phase 1) walks `k-1 -> 0` accumulating the set of
//!   globs that a *later* `Remove` will throw away anyway, so an earlier
//!   `Include` can skip producing items doomed to be removed. It stops
//!   early the moment it finds a cached snapshot for the `(i+1,
//!   current_globs)` pair it is about to need.
//! - **Forward replay** (phase 2) applies operations from wherever the
//!   backward scan stopped, batching consecutive pure-text `Update`s so
//!   they apply in one `O(N)` dictionary pass instead of `O(N*U)`, and
//!   caches snapshots only at prefix lengths an external caller has
//!   actually asked for (the *referenced counts*), keeping the cache
//!   sparse.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use project_eval_common::EvalResult;

use crate::globs::GlobSet;
use crate::operations::{Collaborators, Operation};
use crate::ordered_items::{ItemSnapshot, OrderedItemBuilder};

/// Shared handle to a type's operation list, `Rc<RefCell<_>>` because the
/// core is single-threaded-cooperative (SPEC_FULL.md §5) and multiple
/// operations across types may hold a reference to the same list.
pub type SharedOperationList = Rc<RefCell<OperationList>>;

/// A reference to another item-type's operation list, captured at the
/// moment an operation referencing it was constructed, along with the
/// length the list had at that moment. All later evaluation of this
/// reference uses that captured length, so appending further operations to
/// the referenced type never changes what this operation sees.
#[derive(Clone)]
pub struct ItemListRef {
    list: SharedOperationList,
    count: usize,
}

impl ItemListRef {
    pub fn capture(list: &SharedOperationList) -> Self {
        let count = list.borrow().len();
        list.borrow_mut().mark_as_referenced(count);
        ItemListRef {
            list: Rc::clone(list),
            count,
        }
    }

    pub fn evaluate(&self, collaborators: &Collaborators) -> EvalResult<ItemSnapshot> {
        self.list
            .borrow_mut()
            .evaluate_prefix(self.count, &GlobSet::empty(), collaborators)
    }
}

struct CacheEntry {
    prefix_len: usize,
    globs: GlobSet,
    snapshot: ItemSnapshot,
}

/// The ordered list of operations for one item type, plus its sparse
/// snapshot cache.
pub struct OperationList {
    item_type: String,
    ops: Vec<Operation>,
    cache: Vec<CacheEntry>,
    referenced_counts: HashSet<usize>,
}

impl OperationList {
    pub fn new(item_type: impl Into<String>) -> SharedOperationList {
        Rc::new(RefCell::new(OperationList {
            item_type: item_type.into(),
            ops: Vec::new(),
            cache: Vec::new(),
            referenced_counts: HashSet::new(),
        }))
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    /// Marks `k` as a prefix length an external caller has asked about, so
    /// future evaluations persist a snapshot at that length.
    pub fn mark_as_referenced(&mut self, k: usize) {
        self.referenced_counts.insert(k);
    }

    fn cached_snapshot(&self, prefix_len: usize, globs: &GlobSet) -> Option<ItemSnapshot> {
        self.cache
            .iter()
            .find(|entry| entry.prefix_len == prefix_len && entry.globs.same_instance(globs))
            .map(|entry| entry.snapshot.clone())
    }

    fn store_snapshot(&mut self, prefix_len: usize, globs: GlobSet, snapshot: ItemSnapshot) {
        self.cache.push(CacheEntry {
            prefix_len,
            globs,
            snapshot,
        });
    }

    /// Evaluates operations `[0, k)` against inherited ignore-set `g`,
    /// using and populating the snapshot cache.
    pub fn evaluate_prefix(
        &mut self,
        k: usize,
        g: &GlobSet,
        collaborators: &Collaborators,
    ) -> EvalResult<ItemSnapshot> {
        if k == 0 {
            return Ok(ItemSnapshot::empty());
        }

        // Phase 1: backward scan with Remove-propagation. `current_globs_at
        // [i]` is the ignore-set accumulated from Remove operations at
        // indices strictly greater than `i` (up to `k-1`) -- i.e. the set
        // that forward-replay must honor *while applying* operation `i`,
        // since those later removals will delete anything matching them
        // regardless of what an earlier Include produces.
        let mut stack: Vec<GlobSet> = Vec::new();
        let mut start = 0usize;
        let mut seed: Option<ItemSnapshot> = None;
        let mut current_globs_at: Vec<Option<GlobSet>> = vec![None; k];
        for i in (0..k).rev() {
            let current_globs = stack.last().cloned().unwrap_or_else(|| g.clone());
            current_globs_at[i] = Some(current_globs.clone());
            if let Some(snapshot) = self.cached_snapshot(i + 1, &current_globs) {
                seed = Some(snapshot);
                start = i + 1;
                break;
            }
            if let Operation::Remove(remove) = &self.ops[i] {
                let removed = remove.removed_globs();
                if !removed.is_empty() {
                    stack.push(current_globs.union(removed.iter().cloned()));
                }
            }
        }

        let mut builder = match seed {
            Some(snapshot) => snapshot.to_builder(),
            None => OrderedItemBuilder::new(),
        };

        // Phase 2: forward replay from `start`, reusing the exact
        // per-index ignore-sets the backward scan already computed.
        let mut pending_batch: Vec<usize> = Vec::new();
        for i in start..k {
            let current_globs = current_globs_at[i].clone().unwrap_or_else(|| g.clone());
            match &self.ops[i] {
                Operation::Update(update) if update.is_pure_text_batchable() => {
                    pending_batch.push(i);
                }
                _ => {
                    flush_update_batch(&self.ops, &mut pending_batch, &mut builder, collaborators)?;
                    self.ops[i].apply(&mut builder, &current_globs, collaborators)?;
                }
            }

            let persisted_len = i + 1;
            if self.referenced_counts.contains(&persisted_len) {
                // Snapshot reflects the state *before* any still-pending
                // batched updates are flushed; a referenced count landing
                // mid-batch forces a flush first so the snapshot is
                // complete.
                flush_update_batch(&self.ops, &mut pending_batch, &mut builder, collaborators)?;
                self.store_snapshot(persisted_len, current_globs.clone(), builder.to_immutable());
            }
        }
        flush_update_batch(&self.ops, &mut pending_batch, &mut builder, collaborators)?;

        Ok(builder.to_immutable())
    }
}

fn flush_update_batch(
    ops: &[Operation],
    pending: &mut Vec<usize>,
    builder: &mut OrderedItemBuilder,
    collaborators: &Collaborators,
) -> EvalResult<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let indices = std::mem::take(pending);
    for i in indices {
        if let Operation::Update(update) = &ops[i] {
            update.apply_batched(builder, collaborators)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::RemoveOperation;
    use crate::testing::{test_collaborators, InMemoryFileSystem, MapPropertyProvider};
    use project_eval_common::ElementLocation;

    fn remove_op(spec: &str, globs: Vec<String>) -> Operation {
        Operation::Remove(RemoveOperation::for_test(spec, globs, ElementLocation::unknown()))
    }

    #[test]
    fn referenced_counts_start_sparse() {
        let list = OperationList::new("A");
        assert!(list.borrow().referenced_counts.is_empty());
    }

    #[test]
    fn empty_prefix_yields_empty_snapshot() {
        let list = OperationList::new("A");
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        let snapshot = list.borrow_mut().evaluate_prefix(0, &GlobSet::empty(), &collab).unwrap();
        assert!(snapshot.items().is_empty());
    }

    #[test]
    fn backward_scan_accumulates_remove_globs_without_panicking() {
        let list = OperationList::new("A");
        list.borrow_mut().push(remove_op("*.log", vec!["*.log".to_string()]));
        let fs = InMemoryFileSystem::default();
        let props = MapPropertyProvider::default();
        let collab = test_collaborators(&props, &fs);
        let snapshot = list.borrow_mut().evaluate_prefix(1, &GlobSet::empty(), &collab).unwrap();
        assert!(snapshot.items().is_empty());
    }
}
