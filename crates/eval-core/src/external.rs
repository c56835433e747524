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

//! External collaborators the core depends on but does not implement
//! itself (SPEC_FULL.md §6): filesystem access and item construction.
//! Production callers supply a real filesystem; tests use
//! [`crate::testing`]'s in-memory doubles.

use std::path::Path;

use project_eval_common::EvalResult;

use crate::item::Item;

/// Glob expansion, existence checks, and path normalization. Never
/// implemented by the core itself -- kept behind a trait so evaluation
/// logic is deterministic and testable without touching a real disk.
pub trait FileSystem {
    fn exists(&self, path: &str) -> bool;

    /// Expands `include_glob` against `base_dir`, excluding any path
    /// matching one of `excludes` (already-normalized literal paths or glob
    /// patterns), and returns escaped result paths.
    fn enumerate(&self, base_dir: &Path, include_glob: &str, excludes: &[String])
        -> EvalResult<Vec<String>>;

    fn normalize_path(&self, path: &str) -> String;

    fn current_working_directory(&self) -> String;
}

/// Constructs new [`Item`]s. A trait (rather than calling `Item::new`
/// directly) so a future item shape can plug into `Include` without
/// changing operation code.
pub trait ItemFactory {
    fn create(&self, include: &str, project_directory: &Path) -> Item;

    fn create_from_glob(&self, include: &str, unevaluated_glob: &str, project_directory: &Path) -> Item {
        self.create(include, project_directory)
            .with_unevaluated_include(unevaluated_glob)
    }
}

/// The default [`ItemFactory`]: plain [`Item::new`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultItemFactory;

impl ItemFactory for DefaultItemFactory {
    fn create(&self, include: &str, project_directory: &Path) -> Item {
        Item::new(include, std::sync::Arc::from(project_directory))
    }
}
