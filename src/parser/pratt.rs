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

//! Pratt parser for placeholder expressions
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! pipe        := conditional ( '|' IDENT ( ':' or_expr )* )*
//! conditional := or_expr ( '?' conditional ':' conditional )?
//! or_expr     := and_expr ( '||' and_expr )*
//! and_expr    := equality ( '&&' equality )*
//! equality    := relational ( ( '==' | '!=' | '===' | '!==' ) relational )*
//! relational  := additive ( ( '<' | '<=' | '>' | '>=' ) additive )*
//! additive    := multiplicative ( ( '+' | '-' ) multiplicative )*
//! multiplicative := unary ( ( '*' | '/' | '%' ) unary )*
//! unary       := ( '!' | '-' | '+' ) unary | member
//! member      := primary ( '.' NAME | '[' pipe ']' )*
//! ```

use super::error::{ParseError, ParseResult};
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Filter pipe (lowest)
    Pipe = 1,
    /// Ternary conditional (right associative)
    Conditional = 2,
    /// Logical OR
    Or = 3,
    /// Logical AND
    And = 4,
    /// Equality operators
    Equality = 5,
    /// Relational operators
    Relational = 6,
    /// Additive operators
    Additive = 7,
    /// Multiplicative operators
    Multiplicative = 8,
    /// Prefix operators
    Unary = 9,
    /// Member access and indexing
    Member = 10,
}

impl Precedence {
    /// Get the next higher precedence level for left-associative operators
    #[inline(always)]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Pipe => Precedence::Conditional,
            Precedence::Conditional => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Member,
            Precedence::Member => Precedence::Member,
        }
    }
}

#[inline(always)]
fn get_precedence(token: &Token<'_>) -> Option<Precedence> {
    match token {
        Token::Dot | Token::LeftBracket => Some(Precedence::Member),
        Token::Pipe => Some(Precedence::Pipe),
        Token::Question => Some(Precedence::Conditional),
        Token::Or => Some(Precedence::Or),
        Token::And => Some(Precedence::And),
        Token::Equal | Token::NotEqual | Token::StrictEqual | Token::StrictNotEqual => {
            Some(Precedence::Equality)
        }
        Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual => Some(Precedence::Relational),
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::Multiply | Token::Divide | Token::Modulo => Some(Precedence::Multiplicative),
        _ => None,
    }
}

#[inline(always)]
fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Multiply => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        Token::Modulo => Some(BinaryOperator::Modulo),
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::StrictEqual => Some(BinaryOperator::StrictEqual),
        Token::StrictNotEqual => Some(BinaryOperator::StrictNotEqual),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        _ => None,
    }
}

/// Pratt parser over a single placeholder expression
pub struct PrattParser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Token<'input>>,
    current_start: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a new parser positioned on the first token
    pub fn new(input: &'input str) -> ParseResult<Self> {
        let mut parser = Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
            current_start: 0,
        };
        parser.advance()?;
        Ok(parser)
    }

    #[inline(always)]
    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        self.current_start = self.tokenizer.token_start();
        Ok(())
    }

    #[inline(always)]
    fn current(&self) -> Option<&Token<'input>> {
        self.current_token.as_ref()
    }

    fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::UnexpectedToken {
                token: token.describe(),
                position: self.current_start,
            },
            None => ParseError::UnexpectedEndOfInput {
                position: self.current_start,
            },
        }
    }

    fn expect(&mut self, expected: Token<'input>, description: &'static str) -> ParseResult<()> {
        match &self.current_token {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(&expected) => {
                self.advance()
            }
            Some(_) => Err(ParseError::ExpectedToken {
                expected: Cow::Borrowed(description),
                position: self.current_start,
            }),
            None => Err(ParseError::UnexpectedEndOfInput {
                position: self.current_start,
            }),
        }
    }

    /// Parse primary expression (literals, identifiers, parenthesized expressions)
    fn parse_primary(&mut self) -> ParseResult<ExpressionNode> {
        let position = self.current_start;
        let node = match self.current_token.take() {
            Some(Token::Identifier(name)) => {
                self.advance()?;
                if let Some(Token::LeftParen) = self.current() {
                    return Err(ParseError::Unsupported {
                        message: Cow::Owned(format!("function call '{name}(...)'")),
                        position,
                    });
                }
                return Ok(ExpressionNode::identifier(name));
            }
            Some(Token::Integer(value)) => ExpressionNode::literal(LiteralValue::Integer(value)),
            Some(Token::Decimal(text)) => {
                if text.parse::<f64>().map(f64::is_finite) != Ok(true) {
                    return Err(ParseError::InvalidNumber {
                        value: Cow::Owned(text.to_string()),
                        position,
                    });
                }
                ExpressionNode::literal(LiteralValue::Decimal(text.to_string()))
            }
            Some(Token::String(raw)) => {
                let value = Self::process_string_escapes(raw, position)?;
                ExpressionNode::literal(LiteralValue::String(value))
            }
            Some(Token::True) => ExpressionNode::literal(LiteralValue::Boolean(true)),
            Some(Token::False) => ExpressionNode::literal(LiteralValue::Boolean(false)),
            Some(Token::Null) | Some(Token::Undefined) => {
                ExpressionNode::literal(LiteralValue::Null)
            }
            Some(Token::This) | Some(Token::Dot) => ExpressionNode::This,
            Some(Token::LeftParen) => {
                self.advance()?;
                let inner = self.parse_expression_with_precedence(Precedence::Pipe)?;
                self.expect(Token::RightParen, "')'")?;
                return Ok(inner);
            }
            Some(Token::Not) => {
                self.advance()?;
                let operand = self.parse_expression_with_precedence(Precedence::Unary)?;
                return Ok(ExpressionNode::unary_op(UnaryOperator::Not, operand));
            }
            Some(Token::Minus) => {
                self.advance()?;
                let operand = self.parse_expression_with_precedence(Precedence::Unary)?;
                return Ok(ExpressionNode::unary_op(UnaryOperator::Negate, operand));
            }
            Some(Token::Plus) => {
                self.advance()?;
                let operand = self.parse_expression_with_precedence(Precedence::Unary)?;
                return Ok(ExpressionNode::unary_op(UnaryOperator::Positive, operand));
            }
            Some(token @ (Token::LeftBracket | Token::Assign)) => {
                return Err(ParseError::Unsupported {
                    message: Cow::Owned(format!("{} in expression", token.describe())),
                    position,
                });
            }
            Some(token) => {
                return Err(ParseError::UnexpectedToken {
                    token: token.describe(),
                    position,
                });
            }
            None => return Err(ParseError::UnexpectedEndOfInput { position }),
        };
        self.advance()?;
        Ok(node)
    }

    /// Parse the property name after a dot
    fn parse_property_name(&mut self) -> ParseResult<String> {
        let name = match self.current() {
            Some(Token::Identifier(name)) => (*name).to_string(),
            Some(Token::Integer(index)) => index.to_string(),
            Some(token) => match token.keyword_text() {
                Some(keyword) => keyword.to_string(),
                None => {
                    return Err(ParseError::ExpectedToken {
                        expected: Cow::Borrowed("property name after '.'"),
                        position: self.current_start,
                    });
                }
            },
            None => {
                return Err(ParseError::UnexpectedEndOfInput {
                    position: self.current_start,
                });
            }
        };
        self.advance()?;
        Ok(name)
    }

    /// Parse a filter name and its colon-separated arguments after `|`
    fn parse_filter(&mut self, input: ExpressionNode) -> ParseResult<ExpressionNode> {
        let name = match self.current() {
            Some(Token::Identifier(name)) => (*name).to_string(),
            Some(_) => {
                return Err(ParseError::ExpectedToken {
                    expected: Cow::Borrowed("filter name after '|'"),
                    position: self.current_start,
                });
            }
            None => {
                return Err(ParseError::UnexpectedEndOfInput {
                    position: self.current_start,
                });
            }
        };
        self.advance()?;

        let mut args: SmallVec<[ExpressionNode; 2]> = SmallVec::new();
        while let Some(Token::Colon) = self.current() {
            self.advance()?;
            args.push(self.parse_expression_with_precedence(Precedence::Or)?);
        }

        Ok(ExpressionNode::pipe(input, name, args))
    }

    /// Core Pratt parsing loop
    fn parse_expression_with_precedence(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<ExpressionNode> {
        let mut left = self.parse_primary()?;

        while let Some(current_token) = self.current() {
            let precedence = match get_precedence(current_token) {
                Some(prec) if prec >= min_precedence => prec,
                _ => break,
            };

            match current_token {
                Token::Dot => {
                    self.advance()?;
                    let property = self.parse_property_name()?;
                    left = ExpressionNode::path(left, property);
                }
                Token::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression_with_precedence(Precedence::Pipe)?;
                    self.expect(Token::RightBracket, "']'")?;
                    left = ExpressionNode::index(left, index);
                }
                Token::Pipe => {
                    self.advance()?;
                    left = self.parse_filter(left)?;
                }
                Token::Question => {
                    self.advance()?;
                    let then_expr = self.parse_expression_with_precedence(Precedence::Conditional)?;
                    self.expect(Token::Colon, "':' in conditional expression")?;
                    let else_expr = self.parse_expression_with_precedence(Precedence::Conditional)?;
                    left = ExpressionNode::conditional(left, then_expr, else_expr);
                }
                token => {
                    let op = token_to_binary_op(token).ok_or_else(|| self.unexpected())?;
                    self.advance()?;
                    let right = self.parse_expression_with_precedence(precedence.next_level())?;
                    left = ExpressionNode::binary_op(op, left, right);
                }
            }
        }

        Ok(left)
    }

    /// Parse complete input
    pub fn parse(&mut self) -> ParseResult<ExpressionNode> {
        if self.current_token.is_none() {
            return Err(ParseError::EmptyExpression);
        }

        let expr = self.parse_expression_with_precedence(Precedence::Pipe)?;

        if self.current_token.is_some() {
            return Err(self.unexpected());
        }

        Ok(expr)
    }

    /// Process escape sequences in string literals, including Unicode escapes
    fn process_string_escapes(input: &str, position: usize) -> ParseResult<String> {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                result.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('\'') => result.push('\''),
                Some('"') => result.push('"'),
                Some('u') => {
                    let hex_chars: String = chars.by_ref().take(4).collect();
                    let decoded = (hex_chars.len() == 4)
                        .then(|| u32::from_str_radix(&hex_chars, 16).ok())
                        .flatten()
                        .and_then(char::from_u32);
                    match decoded {
                        Some(unicode_char) => result.push(unicode_char),
                        None => {
                            return Err(ParseError::InvalidEscape {
                                sequence: Cow::Owned(format!("\\u{hex_chars}")),
                                position,
                            });
                        }
                    }
                }
                // Unknown escapes keep the escaped character
                Some(escaped_ch) => result.push(escaped_ch),
                None => {
                    return Err(ParseError::InvalidEscape {
                        sequence: Cow::Borrowed("\\"),
                        position,
                    });
                }
            }
        }

        Ok(result)
    }
}

/// Parse a placeholder expression (public API)
pub fn parse_expression(input: &str) -> ParseResult<ExpressionNode> {
    PrattParser::new(input)?.parse()
}
