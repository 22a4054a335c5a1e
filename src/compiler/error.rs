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


//! Compilation error types

use crate::parser::ParseError;
use thiserror::Error;

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that make an expression impossible to compile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The expression is not valid syntax
    #[error("Syntax error: {0}")]
    Parse(#[from] ParseError),

    /// The expression pipes into a filter nobody registered
    #[error("Unknown filter '{name}'")]
    UnknownFilter {
        /// Filter name as written
        name: String,
    },
}
