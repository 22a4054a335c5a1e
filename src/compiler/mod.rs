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


//! Expression compilation
//!
//! Placeholder expressions are parsed once into an [`ExpressionNode`] and then
//! compiled into a tree of closures over a [`Scope`](crate::evaluator::Scope).
//! Compilation resolves filters against the registry, so evaluation never
//! looks anything up by name. Compiled expressions are cached per engine in an
//! [`ExpressionCache`] and memoized per merge by [`CompileMemo`].
//!
//! [`ExpressionNode`]: crate::ast::ExpressionNode

#![warn(missing_docs)]

mod cache;
mod compiler;
mod error;

pub use cache::{CacheStats, CompileMemo, ExpressionCache};
pub use compiler::{CompiledExpression, EvalFn, ExpressionCompiler};
pub use error::{CompileError, CompileResult};
