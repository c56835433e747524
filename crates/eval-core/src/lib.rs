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

//! Item evaluation: the `Include`/`Remove`/`Update` operation model, its
//! lazy per-item-type snapshot cache, and the evaluator that drives both
//! from a source-ordered element stream. Builds on `project-eval-expr`'s
//! scanner and expanders, supplying the item data and filesystem/property
//! collaborators those expanders need but do not themselves own.

pub mod evaluator;
pub mod external;
pub mod globs;
pub mod item;
pub mod item_expander;
pub mod item_spec;
pub mod operation_list;
pub mod operations;
pub mod ordered_items;
pub mod wildcard;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use evaluator::{Evaluator, ItemElement};
pub use external::{DefaultItemFactory, FileSystem, ItemFactory};
pub use globs::GlobSet;
pub use item::{Item, ItemLike, MetadataMap, PropertyLike};
pub use item_spec::{Fragment, ItemSpec};
pub use operation_list::{ItemListRef, OperationList, SharedOperationList};
pub use operations::{Collaborators, IncludeOperation, Operation, RemoveOperation, UpdateOperation};
pub use ordered_items::{ItemSnapshot, OrderedItemBuilder};
