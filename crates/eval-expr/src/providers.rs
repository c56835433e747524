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

//! External collaborator traits the expander(s) depend on (SPEC_FULL.md
//! §6): property lookup, metadata-table lookup, and property-function
//! invocation. Parsing, condition evaluation and globbing are collaborators
//! of the evaluator crate, not of the expander.

use project_eval_common::EvalResult;

/// The fixed set of built-in (reserved) metadata names. Custom metadata
/// names must not collide with these.
pub const BUILTIN_METADATA_NAMES: &[&str] = &[
    "FullPath",
    "RootDir",
    "Filename",
    "Extension",
    "RelativeDir",
    "Directory",
    "RecursiveDir",
    "Identity",
    "ModifiedTime",
    "CreatedTime",
    "AccessedTime",
    "DefiningProjectFullPath",
    "DefiningProjectDirectory",
    "DefiningProjectName",
    "DefiningProjectExtension",
];

pub fn is_builtin_metadata_name(name: &str) -> bool {
    BUILTIN_METADATA_NAMES
        .iter()
        .any(|b| b.eq_ignore_ascii_case(name))
}

/// Read-only access to the current property values of a project.
pub trait PropertyProvider {
    fn lookup(&self, name: &str) -> Option<String>;
    fn enumerate(&self) -> Vec<(String, String)>;
}

/// Read-only access to a metadata table: either a per-item metadata map, or
/// the metadata declared on a single item element being evaluated.
pub trait MetadataTableLike {
    /// Escaped value for `name` (optionally qualified by `item_type`, which
    /// is `None` for an unqualified reference). Empty string when absent,
    /// per the external-interface contract.
    fn escaped_value(&self, item_type: Option<&str>, name: &str) -> String;

    /// The item type this table is associated with, if any -- used for the
    /// "item referencing its own type in a qualified metadata reference"
    /// diagnostic.
    fn item_type(&self) -> Option<&str> {
        None
    }
}

/// A value returned by a property function invocation: either the raw
/// (typed) result used by "leave typed" mode, or its escaped string form
/// used by "leave escaped" mode.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    Number(f64),
}

impl PropertyValue {
    pub fn to_escaped_string(&self) -> String {
        match self {
            PropertyValue::Str(s) => project_eval_common::escape::escape(s),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Number(n) => n.to_string(),
        }
    }
}

/// Hints threaded through to a property-function invocation; stands in for
/// the "binding flags" of the external interface contract (public vs.
/// non-public members, static vs. instance receiver).
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingHints {
    pub static_member: bool,
}

/// Invokes a method call on a property value, e.g. `$(Foo.ToUpper())` or
/// `$([System.String]::Format(...))`. Out of scope for this crate's own
/// logic -- implementations typically dispatch to a small registry of
/// known methods.
pub trait PropertyFunctionEvaluator {
    fn invoke(
        &self,
        receiver_type: &str,
        receiver_value: Option<&str>,
        function_name: &str,
        args: &[String],
        hints: BindingHints,
    ) -> EvalResult<PropertyValue>;
}

/// A [`PropertyFunctionEvaluator`] that has none: any invocation reports
/// `UnknownItemFunction`. Useful when property-function syntax doesn't
/// appear in the properties under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPropertyFunctions;

impl PropertyFunctionEvaluator for NoPropertyFunctions {
    fn invoke(
        &self,
        _receiver_type: &str,
        _receiver_value: Option<&str>,
        function_name: &str,
        _args: &[String],
        _hints: BindingHints,
    ) -> EvalResult<PropertyValue> {
        Err(project_eval_common::EvalError::invalid_project(
            project_eval_common::ResourceKey::UnknownItemFunction,
            format!("no property function registered for '{function_name}'"),
            project_eval_common::ElementLocation::unknown(),
        ))
    }
}
