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


//! Render error collection and reporting
//!
//! A merge never stops at a failing placeholder. Each failure becomes a
//! [`RenderError`] in the merge's [`ErrorAggregator`]; once the pass is over
//! the engine decides from the aggregator whether the merge succeeded, and an
//! [`ErrorReport`] gives callers one structured summary of everything that went
//! wrong.

#![warn(missing_docs)]

mod aggregator;
mod report;

pub use aggregator::{ErrorAggregator, ErrorKind, RenderError};
pub use report::{ErrorDetail, ErrorReport, ReportCode};
