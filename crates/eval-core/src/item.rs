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

//! The item and property shapes this crate defines (SPEC_FULL.md §9): deep
//! immutable, cloned on any mutation, with metadata shared structurally via
//! `Arc` until a write actually happens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

/// Decouples evaluator logic from the concrete item representation: a
/// second shape (e.g. a task-time item) can implement this trait without
/// touching operation-list or evaluator code.
pub trait ItemLike {
    fn include(&self) -> &str;
    fn metadata(&self, name: &str) -> Option<&str>;
    fn project_directory(&self) -> &Path;
}

/// Decouples evaluator logic from the concrete property representation.
pub trait PropertyLike {
    fn name(&self) -> &str;
    fn value(&self) -> &str;
}

/// An owned, reference-counted metadata table: `IndexMap` preserves
/// declaration order (assignment order matters for diagnostics and for
/// re-reading metadata that was itself built from an earlier metadata
/// value), `Arc` gives cheap structural sharing across clones.
pub type MetadataMap = Arc<IndexMap<String, String>>;

/// One item: the unit the operation list produces, filters and clones.
/// Cloning an `Item` is `O(1)` modulo the owned `include` string; its
/// metadata is shared until a write path (`with_metadata`) forces a copy.
#[derive(Debug, Clone)]
pub struct Item {
    include: String,
    metadata: MetadataMap,
    project_directory: Arc<Path>,
    unevaluated_include: Option<String>,
    normalized: Arc<OnceCell<String>>,
}

impl Item {
    pub fn new(include: impl Into<String>, project_directory: impl Into<Arc<Path>>) -> Self {
        Item {
            include: include.into(),
            metadata: Arc::new(IndexMap::new()),
            project_directory: project_directory.into(),
            unevaluated_include: None,
            normalized: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_unevaluated_include(mut self, unevaluated: impl Into<String>) -> Self {
        self.unevaluated_include = Some(unevaluated.into());
        self
    }

    pub fn unevaluated_include(&self) -> Option<&str> {
        self.unevaluated_include.as_deref()
    }

    pub fn metadata_map(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    /// Returns a clone of `self` with `name` set to `value`, sharing the
    /// rest of the metadata map via copy-on-write.
    pub fn with_metadata(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = IndexMap::clone(&self.metadata);
        map.insert(name.into(), value.into());
        Item {
            include: self.include.clone(),
            metadata: Arc::new(map),
            project_directory: Arc::clone(&self.project_directory),
            unevaluated_include: self.unevaluated_include.clone(),
            // A metadata write invalidates nothing about the normalized
            // include, but the clone must not share the OnceCell instance
            // with a sibling produced from the same base item (Update
            // clones one base item many times; each clone computes its own
            // normalized form independently, even though today it would be
            // byte-identical).
            normalized: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_include(&self, include: impl Into<String>) -> Self {
        Item {
            include: include.into(),
            metadata: Arc::clone(&self.metadata),
            project_directory: Arc::clone(&self.project_directory),
            unevaluated_include: self.unevaluated_include.clone(),
            normalized: Arc::new(OnceCell::new()),
        }
    }

    /// Drops the metadata link while keeping the include -- `ClearMetadata`.
    pub fn without_metadata_link(&self) -> Self {
        Item {
            include: self.include.clone(),
            metadata: Arc::new(IndexMap::new()),
            project_directory: Arc::clone(&self.project_directory),
            unevaluated_include: self.unevaluated_include.clone(),
            normalized: Arc::new(OnceCell::new()),
        }
    }

    /// The item's path normalized against its project directory, computed
    /// once and cached behind a `OnceCell` write barrier (SPEC_FULL.md §5).
    pub fn normalized_path(&self) -> &str {
        self.normalized
            .get_or_init(|| normalize(&self.project_directory, &self.include))
    }
}

impl ItemLike for Item {
    fn include(&self) -> &str {
        &self.include
    }

    fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    fn project_directory(&self) -> &Path {
        &self.project_directory
    }
}

fn normalize(project_directory: &Path, include: &str) -> String {
    let candidate = Path::new(include);
    let joined: PathBuf = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        project_directory.join(candidate)
    };
    joined.to_string_lossy().replace('\\', "/")
}
