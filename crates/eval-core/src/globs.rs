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

//! `GlobSet`: the accumulated "globs to ignore" carried by Remove-
//! backpropagation (SPEC_FULL.md §4.8).
//!
//! The snapshot cache keys on *reference identity*, not content equality --
//! two value-equal `GlobSet`s produced independently must not collide in the
//! cache, or unrelated call sites sharing a textually-identical glob list
//! would alias each other's cached snapshots. Only the backward-scan
//! algorithm in `operation_list` is allowed to construct new instances; the
//! type deliberately exposes no `From<Vec<String>>` impl that a caller could
//! reach for instead.

use std::sync::Arc;

/// An immutable, reference-counted set of glob-fragment texts.
#[derive(Debug, Clone)]
pub struct GlobSet(Arc<[String]>);

impl GlobSet {
    pub fn empty() -> Self {
        GlobSet(Arc::from(Vec::new().into_boxed_slice()))
    }

    /// Builds a new `GlobSet` the union of `self` and `additional`. Always a
    /// fresh instance -- even when `additional` is empty -- so the backward
    /// scan can tell "pushed a frame" apart from "returned the same frame"
    /// by identity alone when that matters to a caller.
    pub fn union(&self, additional: impl IntoIterator<Item = String>) -> Self {
        let mut merged: Vec<String> = self.0.to_vec();
        merged.extend(additional);
        GlobSet(Arc::from(merged.into_boxed_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn globs(&self) -> &[String] {
        &self.0
    }

    /// Cache-key identity comparison: deliberately `Arc::ptr_eq`, not a
    /// content comparison.
    pub fn same_instance(&self, other: &GlobSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for GlobSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for GlobSet {
    /// Structural equality, used only for test assertions on contents --
    /// never for cache lookups, which must use [`GlobSet::same_instance`].
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Eq for GlobSet {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_always_produces_a_new_instance() {
        let a = GlobSet::empty();
        let b = a.union(Vec::<String>::new());
        assert!(!a.same_instance(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn value_equal_sets_are_not_the_same_instance() {
        let a = GlobSet::empty().union(["*.log".to_string()]);
        let b = GlobSet::empty().union(["*.log".to_string()]);
        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
    }

    #[test]
    fn clone_preserves_instance_identity() {
        let a = GlobSet::empty().union(["*.log".to_string()]);
        let cloned = a.clone();
        assert!(a.same_instance(&cloned));
    }
}
