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

//! In-memory test doubles for the external collaborators (SPEC_FULL.md §6).
//! Available under `cfg(test)` within this crate and, for downstream
//! integration tests, behind the `testing` feature.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use project_eval_common::{EvalResult, NullDiagnosticSink};
use project_eval_expr::{EvaluatorConfig, ExpanderOptions, NoPropertyFunctions, PropertyProvider};

use crate::external::{DefaultItemFactory, FileSystem};
use crate::operations::Collaborators;
use crate::wildcard::wildcard_match;

/// A [`FileSystem`] double: existence and glob results are both canned,
/// looked up by exact path / exact glob pattern respectively. A glob pattern
/// with no canned entry falls back to wildcard-matching every `exists`-known
/// path, so tests that only register `add_existing` still see `enumerate`
/// behave sensibly.
#[derive(Default)]
pub struct InMemoryFileSystem {
    existing: RefCell<Vec<String>>,
    glob_results: RefCell<HashMap<String, Vec<String>>>,
}

impl InMemoryFileSystem {
    pub fn add_existing(&mut self, path: impl Into<String>) {
        self.existing.borrow_mut().push(path.into());
    }

    pub fn add_glob_result(&mut self, pattern: impl Into<String>, paths: Vec<String>) {
        self.glob_results.borrow_mut().insert(pattern.into(), paths);
    }
}

impl FileSystem for InMemoryFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.existing.borrow().iter().any(|p| p == path)
    }

    fn enumerate(&self, _base_dir: &Path, include_glob: &str, excludes: &[String]) -> EvalResult<Vec<String>> {
        let canned = self.glob_results.borrow().get(include_glob).cloned();
        let candidates = canned.unwrap_or_else(|| {
            self.existing
                .borrow()
                .iter()
                .filter(|p| wildcard_match(include_glob, p))
                .cloned()
                .collect()
        });
        Ok(candidates
            .into_iter()
            .filter(|p| !excludes.iter().any(|x| wildcard_match(x, p) || x == p))
            .collect())
    }

    fn normalize_path(&self, path: &str) -> String {
        path.replace('\\', "/")
    }

    fn current_working_directory(&self) -> String {
        "/proj".to_string()
    }
}

/// A [`PropertyProvider`] double backed by a plain map.
#[derive(Default, Clone)]
pub struct MapPropertyProvider {
    values: HashMap<String, String>,
}

impl MapPropertyProvider {
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl PropertyProvider for MapPropertyProvider {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn enumerate(&self) -> Vec<(String, String)> {
        self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Assembles a [`Collaborators`] for a test: default options, no property
/// functions, the default item factory, and a sink that discards everything.
pub fn test_collaborators<'a>(properties: &'a MapPropertyProvider, file_system: &'a InMemoryFileSystem) -> Collaborators<'a> {
    Collaborators {
        properties,
        functions: &NoPropertyFunctions,
        file_system,
        item_factory: &DefaultItemFactory,
        diagnostics: &NullDiagnosticSink,
        expander_options: ExpanderOptions::default(),
        evaluator_config: EvaluatorConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_reflects_added_paths() {
        let mut fs = InMemoryFileSystem::default();
        fs.add_existing("a.txt");
        assert!(fs.exists("a.txt"));
        assert!(!fs.exists("b.txt"));
    }

    #[test]
    fn enumerate_falls_back_to_wildcard_matching_existing_paths() {
        let mut fs = InMemoryFileSystem::default();
        fs.add_existing("a.log");
        fs.add_existing("b.cs");
        let found = fs.enumerate(Path::new("/proj"), "*.log", &[]).unwrap();
        assert_eq!(found, vec!["a.log".to_string()]);
    }

    #[test]
    fn enumerate_honors_excludes() {
        let mut fs = InMemoryFileSystem::default();
        fs.add_glob_result("*.cs", vec!["a.cs".to_string(), "b.cs".to_string()]);
        let found = fs.enumerate(Path::new("/proj"), "*.cs", &["b.cs".to_string()]).unwrap();
        assert_eq!(found, vec!["a.cs".to_string()]);
    }
}
