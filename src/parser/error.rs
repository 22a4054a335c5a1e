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

//! Parser error types

use std::borrow::Cow;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while turning placeholder text into an AST
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The placeholder contains no expression at all
    #[error("Empty expression")]
    EmptyExpression,

    /// Unexpected token
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: Cow<'static, str>,
        /// Position where the token was found
        position: usize,
    },

    /// Expected token
    #[error("Expected {expected} at position {position}")]
    ExpectedToken {
        /// The expected token description
        expected: Cow<'static, str>,
        /// Position where the token was expected
        position: usize,
    },

    /// Unexpected end of input at specific position
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEndOfInput {
        /// Position where more input was expected
        position: usize,
    },

    /// Invalid numeric literal
    #[error("Invalid number literal at position {position}: {value}")]
    InvalidNumber {
        /// The literal text
        value: Cow<'static, str>,
        /// Position where the literal starts
        position: usize,
    },

    /// Invalid escape sequence
    #[error("Invalid escape sequence at position {position}: {sequence}")]
    InvalidEscape {
        /// The invalid escape sequence
        sequence: Cow<'static, str>,
        /// Position where the escape sequence was found
        position: usize,
    },

    /// Unclosed string literal
    #[error("Unclosed string literal starting at position {position}")]
    UnclosedString {
        /// Position where the string literal starts
        position: usize,
    },

    /// Syntax the expression language deliberately lacks (calls, assignment)
    #[error("Unsupported syntax at position {position}: {message}")]
    Unsupported {
        /// What was attempted
        message: Cow<'static, str>,
        /// Position of the construct
        position: usize,
    },
}

impl ParseError {
    /// Byte offset inside the expression where the error was detected
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::EmptyExpression => None,
            Self::UnexpectedToken { position, .. }
            | Self::ExpectedToken { position, .. }
            | Self::UnexpectedEndOfInput { position }
            | Self::InvalidNumber { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::UnclosedString { position }
            | Self::Unsupported { position, .. } => Some(*position),
        }
    }
}
