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

//! End-to-end scenarios run against the public evaluator façade.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use project_eval_common::ElementLocation;
use project_eval_core::evaluator::ElementKind;
use project_eval_core::item_expander::{apply_transform, join_with_separator, Pair};
use project_eval_core::testing::{test_collaborators, InMemoryFileSystem, MapPropertyProvider};
use project_eval_core::{Evaluator, Fragment, Item, ItemElement, ItemLike, ItemSpec};
use project_eval_expr::TransformCapture;

fn project_dir() -> Arc<Path> {
    Arc::from(PathBuf::from("/proj").as_path())
}

fn include_element(item_type: &str, spec: &str) -> ItemElement {
    ItemElement {
        item_type: item_type.to_string(),
        kind: ElementKind::Include {
            spec: spec.to_string(),
            exclude: None,
        },
        metadata: Vec::new(),
        condition_result: true,
        location: ElementLocation::unknown(),
    }
}

#[test]
fn include_then_update_sets_metadata_on_the_matched_item_only() {
    let mut evaluator = Evaluator::new(project_dir());
    evaluator.add_element(include_element("A", "x.cs;y.cs"));
    evaluator.add_element(ItemElement {
        item_type: "A".to_string(),
        kind: ElementKind::Update {
            spec: "x.cs".to_string(),
            match_on_metadata: Vec::new(),
        },
        metadata: vec![("M".to_string(), "one".to_string())],
        condition_result: true,
        location: ElementLocation::unknown(),
    });

    let fs = InMemoryFileSystem::default();
    let props = MapPropertyProvider::default();
    let collab = test_collaborators(&props, &fs);
    let items = evaluator.evaluate_type("A", &collab).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].include(), "x.cs");
    assert_eq!(items[0].metadata("M"), Some("one"));
    assert_eq!(items[1].include(), "y.cs");
    assert_eq!(items[1].metadata("M"), None);
}

#[test]
fn include_then_remove_by_glob_drops_only_the_matching_extension() {
    let mut evaluator = Evaluator::new(project_dir());
    evaluator.add_element(include_element("A", "a.txt;b.txt;c.log"));
    evaluator.add_element(ItemElement {
        item_type: "A".to_string(),
        kind: ElementKind::Remove {
            spec: "*.log".to_string(),
            match_on_metadata: Vec::new(),
        },
        metadata: Vec::new(),
        condition_result: true,
        location: ElementLocation::unknown(),
    });

    let fs = InMemoryFileSystem::default();
    let props = MapPropertyProvider::default();
    let collab = test_collaborators(&props, &fs);
    let items = evaluator.evaluate_type("A", &collab).unwrap();

    let includes: Vec<_> = items.iter().map(|i| i.include().to_string()).collect();
    assert_eq!(includes, vec!["a.txt".to_string(), "b.txt".to_string()]);
}

#[test]
fn transform_with_metadata_template_resolves_per_item() {
    let dir = project_dir();
    let a = vec![
        Item::new("src/foo.cs", Arc::clone(&dir)).with_metadata("Tag", "T1"),
        Item::new("src/bar.cs", Arc::clone(&dir)).with_metadata("Tag", "T2"),
    ];
    let pairs: Vec<Pair> = a
        .iter()
        .map(|item| Pair::new(item.include().to_string(), item.clone()))
        .collect();

    let fs = InMemoryFileSystem::default();
    let loc = ElementLocation::unknown();
    let transform = TransformCapture::Quoted("%(Tag)-%(Filename)".to_string());
    let transformed = apply_transform(pairs, &transform, &loc, &fs).unwrap();

    assert_eq!(join_with_separator(&transformed, None), "T1-foo;T2-bar");
}

#[test]
fn self_reference_remove_clears_the_whole_type() {
    let mut evaluator = Evaluator::new(project_dir());
    evaluator.add_element(include_element("A", "x;y"));
    evaluator.add_element(ItemElement {
        item_type: "A".to_string(),
        kind: ElementKind::Remove {
            spec: "@(A)".to_string(),
            match_on_metadata: Vec::new(),
        },
        metadata: Vec::new(),
        condition_result: true,
        location: ElementLocation::unknown(),
    });

    let fs = InMemoryFileSystem::default();
    let props = MapPropertyProvider::default();
    let collab = test_collaborators(&props, &fs);
    assert!(evaluator.evaluate_type("A", &collab).unwrap().is_empty());
}

#[test]
fn include_with_both_item_expression_and_exclude() {
    let mut evaluator = Evaluator::new(project_dir());
    evaluator.add_element(include_element("B", "b1;b2"));
    evaluator.add_element(ItemElement {
        item_type: "A".to_string(),
        kind: ElementKind::Include {
            spec: "@(B);extra".to_string(),
            exclude: Some("b2".to_string()),
        },
        metadata: Vec::new(),
        condition_result: true,
        location: ElementLocation::unknown(),
    });

    let fs = InMemoryFileSystem::default();
    let props = MapPropertyProvider::default();
    let collab = test_collaborators(&props, &fs);
    let items = evaluator.evaluate_type("A", &collab).unwrap();

    let includes: Vec<_> = items.iter().map(|i| i.include().to_string()).collect();
    assert_eq!(includes, vec!["b1".to_string(), "extra".to_string()]);
}

#[test]
fn intrinsic_distinct_drops_case_insensitive_duplicates() {
    let dir = project_dir();
    let pairs = vec![
        Pair::new("x", Item::new("x", Arc::clone(&dir))),
        Pair::new("X", Item::new("X", Arc::clone(&dir))),
        Pair::new("y", Item::new("y", Arc::clone(&dir))),
    ];
    let fs = InMemoryFileSystem::default();
    let loc = ElementLocation::unknown();
    let transform = TransformCapture::Function {
        name: "Distinct".to_string(),
        args: Vec::new(),
    };
    let out = apply_transform(pairs, &transform, &loc, &fs).unwrap();
    assert_eq!(join_with_separator(&out, None), "x;y");
}

#[test]
fn exists_filter_keeps_only_items_present_on_disk() {
    let dir = project_dir();
    let mut fs = InMemoryFileSystem::default();
    fs.add_existing("a.txt");
    let pairs = vec![
        Pair::new("a.txt", Item::new("a.txt", Arc::clone(&dir))),
        Pair::new("b.txt", Item::new("b.txt", Arc::clone(&dir))),
    ];
    let loc = ElementLocation::unknown();
    let transform = TransformCapture::Function {
        name: "Exists".to_string(),
        args: Vec::new(),
    };
    let out = apply_transform(pairs, &transform, &loc, &fs).unwrap();
    assert_eq!(join_with_separator(&out, None), "a.txt");
}

#[test]
fn semicolon_inside_an_item_expression_separator_is_not_a_top_level_split() {
    let spec = ItemSpec::parse("@(A, ';'); tail");
    assert_eq!(spec.fragments.len(), 2);
    assert!(matches!(&spec.fragments[0], Fragment::ItemExpression(c) if c.item_type == "A"));
    assert!(matches!(&spec.fragments[1], Fragment::Value(v) if v == "tail"));
}
