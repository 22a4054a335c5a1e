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


//! Error types for expression evaluation

use crate::registry::FilterError;
use std::borrow::Cow;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors raised while evaluating a compiled expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Arithmetic on operands that cannot be coerced to numbers
    #[error("Operator '{operator}' cannot be applied to {left} and {right}")]
    InvalidOperand {
        /// Operator symbol
        operator: Cow<'static, str>,
        /// Left operand, rendered for the message
        left: String,
        /// Right operand, rendered for the message
        right: String,
    },

    /// Unary arithmetic on a non-numeric operand
    #[error("Operator '{operator}' cannot be applied to {operand}")]
    InvalidUnaryOperand {
        /// Operator symbol
        operator: Cow<'static, str>,
        /// Operand, rendered for the message
        operand: String,
    },

    /// Division or modulo by zero
    #[error("Division by zero in '{operator}'")]
    DivisionByZero {
        /// Operator symbol
        operator: Cow<'static, str>,
    },

    /// The result of an arithmetic operation is not a finite number
    #[error("Operator '{operator}' produced a non-finite number")]
    NonFiniteNumber {
        /// Operator symbol
        operator: Cow<'static, str>,
    },

    /// A filter rejected its input or arguments
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
}

impl EvaluationError {
    /// Create an invalid operand error for a binary operator
    pub fn invalid_operand(
        operator: impl Into<Cow<'static, str>>,
        left: &serde_json::Value,
        right: &serde_json::Value,
    ) -> Self {
        Self::InvalidOperand {
            operator: operator.into(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}
