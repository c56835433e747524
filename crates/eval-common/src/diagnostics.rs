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

//! Abstract diagnostic sink. The evaluator never talks to a concrete
//! logging transport directly; it reports through this trait, matching the
//! "Logging sink" external interface in the specification.

use crate::location::ElementLocation;
use std::fmt;

/// Relative importance of a diagnostic, independent of any particular
/// logging backend's level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Importance {
    Low,
    Normal,
    High,
}

/// Receives comments emitted by the evaluator. Implementations must not
/// propagate panics across this boundary -- a broken logger should not
/// break evaluation.
pub trait DiagnosticSink {
    fn log_comment(
        &self,
        importance: Importance,
        location: &ElementLocation,
        resource_key: &str,
        args: fmt::Arguments<'_>,
    );
}

/// Forwards diagnostics to the `log` facade, the same crate
/// `datafusion-optimizer` and `datafusion-physical-expr` use for their own
/// rule/operator tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnosticSink;

impl DiagnosticSink for LogDiagnosticSink {
    fn log_comment(
        &self,
        importance: Importance,
        location: &ElementLocation,
        resource_key: &str,
        args: fmt::Arguments<'_>,
    ) {
        match importance {
            Importance::Low => log::trace!("{location} [{resource_key}]: {args}"),
            Importance::Normal => log::debug!("{location} [{resource_key}]: {args}"),
            Importance::High => log::warn!("{location} [{resource_key}]: {args}"),
        }
    }
}

/// Discards every diagnostic. Useful for tests that only care about the
/// evaluated result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn log_comment(
        &self,
        _importance: Importance,
        _location: &ElementLocation,
        _resource_key: &str,
        _args: fmt::Arguments<'_>,
    ) {
    }
}
