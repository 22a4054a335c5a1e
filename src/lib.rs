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


//! Mail-merge rendering for document templates
//!
//! Templates are Office-style containers whose text carries placeholder tags:
//! `{customer.name}`, `{amount | currency}`, `{#items}...{/items}` sections
//! and `{^items}...{/}` inverted sections. [`MergeEngine`] evaluates every tag
//! against a JSON data object and reassembles the document, collecting failing
//! tags into a single [`ErrorReport`] instead of stopping at the first one.
//!
//! ```
//! use docmerge::{MergeEngine, MergeOptions};
//! use serde_json::json;
//!
//! let engine = MergeEngine::default();
//! let out = engine
//!     .render_markup("<w:t>Hello {name | upper}</w:t>", &json!({"name": "ann"}), &MergeOptions::default())
//!     .unwrap();
//! assert_eq!(out, "<w:t xml:space=\"preserve\">Hello ANN</w:t>");
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;

// Re-export main types
pub use compiler::{CompileError, CompiledExpression, ExpressionCache};
pub use config::{Delimiters, EngineConfig, MergeOptions};
pub use diagnostics::{ErrorDetail, ErrorKind, ErrorReport, RenderError, ReportCode};
pub use document::{DocumentPackage, MarkupDialect, PackageKind, PackagePart, TagKind};
pub use engine::{MergeEngine, TagReport};
pub use error::{MergeError, MergeResult, PartialMerge};
pub use evaluator::{EvaluationError, Scope};
pub use parser::{ParseError, parse_expression as parse};
pub use registry::{FilterError, FilterRegistry, NumberLocale, TemplateFilter};
