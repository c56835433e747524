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

//! Expression scanning and expansion: the embedded-reference mini-languages
//! (`$(property)`, `@(item vector)`, `%(metadata)`), the hand-written
//! scanner that recognizes them, and the metadata/property expanders built
//! on top of it. Item-vector transform application lives in the evaluation
//! crate, which owns item data.

pub mod capture;
pub mod metadata_expander;
pub mod names;
pub mod options;
pub mod property_expander;
pub mod providers;
pub mod scanner;
pub mod semicolon;

pub use capture::{ItemVectorCapture, MetadataCapture, PropertyCapture, TransformCapture};
pub use metadata_expander::expand_metadata;
pub use names::{collect_names_and_metadata, CollectedNames};
pub use options::{EvaluatorConfig, ExpanderOptions};
pub use property_expander::{expand_properties, ExpandedProperty, PropertiesUseTracker};
pub use providers::{
    is_builtin_metadata_name, BindingHints, MetadataTableLike, NoPropertyFunctions,
    PropertyFunctionEvaluator, PropertyProvider, PropertyValue, BUILTIN_METADATA_NAMES,
};
pub use scanner::{
    scan_once, ConstructKind, Construct, ItemExpressionEnumerator, ScanOutcome,
};
pub use semicolon::split_semicolon_separated;
