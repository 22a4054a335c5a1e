// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Expression evaluation
//!
//! Compiled expressions run against a [`Scope`]: the data object of the
//! current merge, or one element of a repeating section with the enclosing
//! scopes still reachable. Resolution never fails; absent values are `null`.
//! Operator semantics live in [`operators`].

#![warn(missing_docs)]

mod error;
pub mod operators;
mod path;
mod scope;

pub use error::{EvaluationError, EvaluationResult};
pub use path::{MemberKey, PathSegment, PropertyPath, get_member};
pub use scope::{LoopVariable, Scope};
