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

//! Placeholder expression parser
//!
//! A hand-written tokenizer feeds a Pratt parser that produces an
//! [`ExpressionNode`](crate::ast::ExpressionNode) tree.

#![warn(missing_docs)]

pub mod error;
pub mod pratt;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{PrattParser, Precedence, parse_expression};
pub use tokenizer::{Token, Tokenizer};

/// Parse a placeholder expression string into an AST
pub fn parse(input: &str) -> ParseResult<crate::ast::ExpressionNode> {
    parse_expression(input)
}
