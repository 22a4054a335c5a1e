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

//! Tokenizer for placeholder expressions
//!
//! Works on bytes for the ASCII hot path and falls back to `char` decoding
//! only for non-ASCII identifiers and typographic quotes. Word processors
//! routinely replace `'` and `"` with curly quotes while the author types a
//! template, so `‘ ’` and `“ ”` delimit strings just like their ASCII forms.

use super::error::{ParseError, ParseResult};
use std::borrow::Cow;
use unicode_xid::UnicodeXID;

/// Token produced by the [`Tokenizer`]
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Decimal literal as string slice, parsed on demand (e.g., 3.14, 1e3)
    Decimal(&'input str),
    /// String literal contents, escapes still unprocessed
    String(&'input str),
    /// Identifier (e.g., `customer`, `$index`)
    Identifier(&'input str),

    // Keywords
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `this`
    This,

    // Operators
    /// Addition operator (+)
    Plus,
    /// Subtraction operator (-)
    Minus,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
    /// Remainder operator (%)
    Modulo,
    /// Loose equality (==)
    Equal,
    /// Loose inequality (!=)
    NotEqual,
    /// Strict equality (===)
    StrictEqual,
    /// Strict inequality (!==)
    StrictNotEqual,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
    /// Logical NOT (!)
    Not,
    /// Filter pipe (|)
    Pipe,
    /// Ternary question mark (?)
    Question,
    /// Colon (:) for ternaries and filter arguments
    Colon,

    // Delimiters
    /// Dot operator (.) for property access
    Dot,
    /// Left square bracket [
    LeftBracket,
    /// Right square bracket ]
    RightBracket,
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Comma separator (,)
    Comma,
    /// Assignment (=), always rejected by the parser
    Assign,
}

impl<'input> Token<'input> {
    /// Get keyword from string
    #[inline]
    pub fn from_keyword(s: &str) -> Option<Token<'input>> {
        match s {
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            "null" => Some(Token::Null),
            "undefined" => Some(Token::Undefined),
            "this" => Some(Token::This),
            _ => None,
        }
    }

    /// Source spelling of keywords, used when a keyword appears as a property name
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Token::True => Some("true"),
            Token::False => Some("false"),
            Token::Null => Some("null"),
            Token::Undefined => Some("undefined"),
            Token::This => Some("this"),
            _ => None,
        }
    }

    /// Short human-readable description used in error messages
    pub fn describe(&self) -> Cow<'static, str> {
        match self {
            Token::Integer(i) => Cow::Owned(i.to_string()),
            Token::Decimal(d) | Token::Identifier(d) => Cow::Owned((*d).to_string()),
            Token::String(s) => Cow::Owned(format!("'{s}'")),
            other => Cow::Owned(format!("{other:?}")),
        }
    }
}

/// Quote families accepted as string delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteKind {
    Single,
    Double,
}

impl QuoteKind {
    fn of(ch: char) -> Option<Self> {
        match ch {
            '\'' | '\u{2018}' | '\u{2019}' => Some(Self::Single),
            '"' | '\u{201C}' | '\u{201D}' => Some(Self::Double),
            _ => None,
        }
    }
}

/// Tokenizer over a single placeholder expression
#[derive(Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    end: usize,
    token_start: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a new tokenizer
    #[inline]
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            end: input.len(),
            token_start: 0,
        }
    }

    /// Current byte position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte position where the most recently returned token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    #[inline(always)]
    fn slice(&self, start: usize, end: usize) -> &'input str {
        &self.input[start..end]
    }

    #[inline(always)]
    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    #[inline(always)]
    fn is_id_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_' || ch == '$' || (!ch.is_ascii() && ch.is_xid_start())
    }

    #[inline(always)]
    fn is_id_continue(ch: char) -> bool {
        ch.is_ascii_alphanumeric()
            || ch == '_'
            || ch == '$'
            || (!ch.is_ascii() && ch.is_xid_continue())
    }

    /// Skip ASCII whitespace plus the no-break spaces word processors insert
    #[inline(always)]
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' | '\u{00A0}' | '\u{202F}' => self.pos += ch.len_utf8(),
                _ => break,
            }
        }
    }

    fn parse_number(&mut self) -> ParseResult<Token<'input>> {
        let start = self.pos;
        while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        let mut is_decimal = false;
        if self.pos + 1 < self.end
            && self.bytes[self.pos] == b'.'
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            is_decimal = true;
            self.pos += 1;
            while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }

        if self.pos < self.end && matches!(self.bytes[self.pos], b'e' | b'E') {
            let mut lookahead = self.pos + 1;
            if lookahead < self.end && matches!(self.bytes[lookahead], b'+' | b'-') {
                lookahead += 1;
            }
            if lookahead < self.end && self.bytes[lookahead].is_ascii_digit() {
                is_decimal = true;
                self.pos = lookahead;
                while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            } else {
                return Err(ParseError::InvalidNumber {
                    value: Cow::Owned(self.slice(start, lookahead.min(self.end)).to_string()),
                    position: start,
                });
            }
        }

        let text = self.slice(start, self.pos);
        if is_decimal {
            return Ok(Token::Decimal(text));
        }
        // Integers beyond i64 keep their magnitude as a decimal
        Ok(text
            .parse::<i64>()
            .map(Token::Integer)
            .unwrap_or(Token::Decimal(text)))
    }

    fn parse_identifier(&mut self) -> &'input str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if Self::is_id_continue(ch) {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        self.slice(start, self.pos)
    }

    fn parse_string_literal(&mut self, open: char) -> ParseResult<&'input str> {
        let start = self.pos;
        let kind = QuoteKind::of(open);
        self.pos += open.len_utf8();
        let content_start = self.pos;

        while let Some(ch) = self.peek_char() {
            if ch == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek_char() {
                    self.pos += escaped.len_utf8();
                }
                continue;
            }
            if QuoteKind::of(ch) == kind {
                let content = self.slice(content_start, self.pos);
                self.pos += ch.len_utf8();
                return Ok(content);
            }
            self.pos += ch.len_utf8();
        }

        Err(ParseError::UnclosedString { position: start })
    }

    #[inline(always)]
    fn single(&mut self, token: Token<'input>) -> Token<'input> {
        self.pos += 1;
        token
    }

    /// Get the next token, `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();
        self.token_start = self.pos;

        if self.pos >= self.end {
            return Ok(None);
        }

        let next = self.bytes.get(self.pos + 1).copied();
        let token = match self.bytes[self.pos] {
            b'.' => self.single(Token::Dot),
            b'[' => self.single(Token::LeftBracket),
            b']' => self.single(Token::RightBracket),
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b',' => self.single(Token::Comma),
            b':' => self.single(Token::Colon),
            b'?' => self.single(Token::Question),
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'*' => self.single(Token::Multiply),
            b'/' => self.single(Token::Divide),
            b'%' => self.single(Token::Modulo),
            b'|' => {
                if next == Some(b'|') {
                    self.pos += 2;
                    Token::Or
                } else {
                    self.single(Token::Pipe)
                }
            }
            b'&' => {
                if next == Some(b'&') {
                    self.pos += 2;
                    Token::And
                } else {
                    return Err(ParseError::UnexpectedToken {
                        token: Cow::Borrowed("&"),
                        position: self.pos,
                    });
                }
            }
            b'=' => match (next, self.bytes.get(self.pos + 2).copied()) {
                (Some(b'='), Some(b'=')) => {
                    self.pos += 3;
                    Token::StrictEqual
                }
                (Some(b'='), _) => {
                    self.pos += 2;
                    Token::Equal
                }
                _ => self.single(Token::Assign),
            },
            b'!' => match (next, self.bytes.get(self.pos + 2).copied()) {
                (Some(b'='), Some(b'=')) => {
                    self.pos += 3;
                    Token::StrictNotEqual
                }
                (Some(b'='), _) => {
                    self.pos += 2;
                    Token::NotEqual
                }
                _ => self.single(Token::Not),
            },
            b'<' => {
                if next == Some(b'=') {
                    self.pos += 2;
                    Token::LessThanOrEqual
                } else {
                    self.single(Token::LessThan)
                }
            }
            b'>' => {
                if next == Some(b'=') {
                    self.pos += 2;
                    Token::GreaterThanOrEqual
                } else {
                    self.single(Token::GreaterThan)
                }
            }
            b'0'..=b'9' => self.parse_number()?,
            _ => {
                let ch = self.peek_char().unwrap_or('\0');
                if QuoteKind::of(ch).is_some() {
                    Token::String(self.parse_string_literal(ch)?)
                } else if Self::is_id_start(ch) {
                    let ident = self.parse_identifier();
                    Token::from_keyword(ident).unwrap_or(Token::Identifier(ident))
                } else {
                    return Err(ParseError::UnexpectedToken {
                        token: Cow::Owned(ch.to_string()),
                        position: self.pos,
                    });
                }
            }
        };

        Ok(Some(token))
    }

    /// Tokenize the whole input
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Token<'input>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let mut tokenizer = Tokenizer::new("a === b !== c || d && !e | upper");
        let tokens = tokenizer.tokenize_all().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a"),
                Token::StrictEqual,
                Token::Identifier("b"),
                Token::StrictNotEqual,
                Token::Identifier("c"),
                Token::Or,
                Token::Identifier("d"),
                Token::And,
                Token::Not,
                Token::Identifier("e"),
                Token::Pipe,
                Token::Identifier("upper"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let mut tokenizer = Tokenizer::new("42 3.14 1e3 99999999999999999999");
        let tokens = tokenizer.tokenize_all().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Integer(42),
                Token::Decimal("3.14"),
                Token::Decimal("1e3"),
                Token::Decimal("99999999999999999999"),
            ]
        );
    }

    #[test]
    fn test_integer_followed_by_property() {
        let mut tokenizer = Tokenizer::new("items.0.name");
        let tokens = tokenizer.tokenize_all().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("items"),
                Token::Dot,
                Token::Integer(0),
                Token::Dot,
                Token::Identifier("name"),
            ]
        );
    }

    #[test]
    fn test_typographic_quotes() {
        let mut tokenizer = Tokenizer::new("date:\u{2018}dd/MM\u{2019} \u{201C}x\u{201D}");
        let tokens = tokenizer.tokenize_all().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("date"),
                Token::Colon,
                Token::String("dd/MM"),
                Token::String("x"),
            ]
        );
    }

    #[test]
    fn test_unicode_identifiers_and_dollar() {
        let mut tokenizer = Tokenizer::new("société.$index");
        let tokens = tokenizer.tokenize_all().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("société"),
                Token::Dot,
                Token::Identifier("$index"),
            ]
        );
    }

    #[test]
    fn test_unclosed_string() {
        let mut tokenizer = Tokenizer::new("'abc");
        assert_eq!(
            tokenizer.tokenize_all(),
            Err(ParseError::UnclosedString { position: 0 })
        );
    }

    #[test]
    fn test_no_break_space_is_whitespace() {
        let mut tokenizer = Tokenizer::new("\u{00A0}name\u{00A0}");
        assert_eq!(
            tokenizer.tokenize_all().unwrap(),
            vec![Token::Identifier("name")]
        );
    }
}
