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

//! Parsed captures produced by the expression scanner.

/// One `->`-chained step of an item vector, after the item type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformCapture {
    /// `->'...'`: a quoted substitution template, resolved per-item against
    /// metadata and built-in item-spec modifiers.
    Quoted(String),
    /// `->Name(arg0, arg1, ...)`: an intrinsic transform or string-method
    /// call. Arguments have had their surrounding quotes stripped but are
    /// otherwise unexpanded (they may still contain `%(...)`/`$(...)`).
    Function { name: String, args: Vec<String> },
}

/// A parsed `@(type[->transform]*[, 'sep'])` reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemVectorCapture {
    pub item_type: String,
    pub transforms: Vec<TransformCapture>,
    pub separator: Option<String>,
}

impl ItemVectorCapture {
    /// True for the bare `@(Type)` form with no transforms and no
    /// separator -- the form that several operations special-case (e.g.
    /// Remove's "clear the whole list" shortcut, Update's "match everything"
    /// shortcut).
    pub fn is_bare_reference(&self) -> bool {
        self.transforms.is_empty() && self.separator.is_none()
    }
}

/// A parsed `%(name)` or `%(itemtype.name)` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCapture {
    pub item_type: Option<String>,
    pub name: String,
}

impl MetadataCapture {
    /// The canonical key used as a `HashMap` key by the names-and-metadata
    /// collector: `name` or `itemtype.name`, case preserved.
    pub fn key(&self) -> String {
        match &self.item_type {
            Some(t) => format!("{t}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A parsed `$(name)` or `$(name.Method(args))` reference. Method
/// invocation itself is delegated to an external collaborator (the
/// property-function evaluator); this capture only carries the raw pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCapture {
    pub name: String,
    /// `Some((method_name, raw_args))` when the reference is a function
    /// invocation on the property value rather than a plain lookup.
    pub function: Option<(String, String)>,
}
