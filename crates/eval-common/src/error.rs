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

use crate::location::ElementLocation;
use std::fmt;

/// Well-known resource keys used by [`EvalError::InvalidProject`].
///
/// These mirror the taxonomy in the specification's error-reporting
/// contract (§6/§7): a fixed, documented set of reasons rather than
/// free-form strings, so callers can match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKey {
    InvalidItemFunctionSyntax,
    UnterminatedExpression,
    EmptyMetadataName,
    CannotEvaluateItemMetadata,
    EmbeddedItemVectorCannotBeItemized,
    QualifiedMetadataInTransformNotAllowed,
    ItemReferencingSelfInTarget,
    UnknownItemFunction,
    FileSystemOperationFailed,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKey::InvalidItemFunctionSyntax => "InvalidItemFunctionSyntax",
            ResourceKey::UnterminatedExpression => "UnterminatedExpression",
            ResourceKey::EmptyMetadataName => "EmptyMetadataName",
            ResourceKey::CannotEvaluateItemMetadata => "CannotEvaluateItemMetadata",
            ResourceKey::EmbeddedItemVectorCannotBeItemized => {
                "EmbeddedItemVectorCannotBeItemized"
            }
            ResourceKey::QualifiedMetadataInTransformNotAllowed => {
                "QualifiedMetadataInTransformNotAllowed"
            }
            ResourceKey::ItemReferencingSelfInTarget => "ItemReferencingSelfInTarget",
            ResourceKey::UnknownItemFunction => "UnknownItemFunction",
            ResourceKey::FileSystemOperationFailed => "FileSystemOperationFailed",
        };
        f.write_str(s)
    }
}

/// The single structured error kind produced by this crate.
///
/// Every fallible public entry point in the evaluator returns
/// [`EvalResult`]. There is deliberately only one error variant family
/// (`InvalidProject`) per the specification; resource keys distinguish the
/// cause.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("{resource_key} at {location}: {message}")]
    InvalidProject {
        resource_key: ResourceKey,
        message: String,
        location: ElementLocation,
    },
}

impl EvalError {
    pub fn invalid_project(
        resource_key: ResourceKey,
        message: impl Into<String>,
        location: ElementLocation,
    ) -> Self {
        EvalError::InvalidProject {
            resource_key,
            message: message.into(),
            location,
        }
    }

    pub fn resource_key(&self) -> ResourceKey {
        match self {
            EvalError::InvalidProject { resource_key, .. } => *resource_key,
        }
    }

    pub fn location(&self) -> &ElementLocation {
        match self {
            EvalError::InvalidProject { location, .. } => location,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
