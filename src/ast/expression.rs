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

//! Expression AST node definitions

use crate::ast::operator::{BinaryOperator, UnaryOperator};
use smallvec::SmallVec;
use std::fmt;

/// AST representation of placeholder expressions
///
/// Large variants are boxed to keep the enum small; the common cases
/// (identifiers and property paths) stay inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpressionNode {
    /// Literal value (string, number, boolean, null)
    Literal(LiteralValue),

    /// Identifier resolved against the scope chain
    Identifier(String),

    /// The current loop element (`.` or `this`)
    This,

    /// Property navigation (object.property)
    Path {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Property name
        property: String,
    },

    /// Bracket access (sequence\[index\] or object\['key'\])
    Index {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Index expression
        index: Box<ExpressionNode>,
    },

    /// Unary operation (negation, not)
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp(Box<BinaryOpData>),

    /// Ternary conditional (`cond ? a : b`)
    Conditional(Box<ConditionalData>),

    /// Filter application (`input | name:arg1:arg2`)
    Pipe(Box<PipeData>),
}

/// Binary operation data (separate struct to optimize enum size)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Conditional expression data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionalData {
    /// Condition
    pub condition: ExpressionNode,
    /// Value when the condition is truthy
    pub then_expr: ExpressionNode,
    /// Value when the condition is falsy
    pub else_expr: ExpressionNode,
}

/// Pipe data: the piped input and the filter applied to it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipeData {
    /// Expression whose value is handed to the filter
    pub input: ExpressionNode,
    /// Filter invocation
    pub filter: FilterInvocation,
}

/// A named filter with its colon-separated arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterInvocation {
    /// Registered filter name
    pub name: String,
    /// Argument expressions (SmallVec for the common case of 0-2 args)
    pub args: SmallVec<[ExpressionNode; 2]>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// `null` or `undefined`
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Decimal literal (stored as string to keep the node hashable)
    Decimal(String),
    /// String literal, escapes already processed
    String(String),
}

impl ExpressionNode {
    /// Create a literal expression
    pub fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Create an identifier expression
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a property navigation expression
    pub fn path(base: ExpressionNode, property: impl Into<String>) -> Self {
        Self::Path {
            base: Box::new(base),
            property: property.into(),
        }
    }

    /// Create an index access expression
    pub fn index(base: ExpressionNode, index: ExpressionNode) -> Self {
        Self::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a conditional expression
    pub fn conditional(
        condition: ExpressionNode,
        then_expr: ExpressionNode,
        else_expr: ExpressionNode,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalData {
            condition,
            then_expr,
            else_expr,
        }))
    }

    /// Create a pipe expression applying `name` to `input`
    pub fn pipe(
        input: ExpressionNode,
        name: impl Into<String>,
        args: impl Into<SmallVec<[ExpressionNode; 2]>>,
    ) -> Self {
        Self::Pipe(Box::new(PipeData {
            input,
            filter: FilterInvocation {
                name: name.into(),
                args: args.into(),
            },
        }))
    }

    /// Names of every filter referenced by this expression, in source order
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_filter_names(&mut names);
        names
    }

    fn collect_filter_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) | Self::Identifier(_) | Self::This => {}
            Self::Path { base, .. } => base.collect_filter_names(names),
            Self::Index { base, index } => {
                base.collect_filter_names(names);
                index.collect_filter_names(names);
            }
            Self::UnaryOp { operand, .. } => operand.collect_filter_names(names),
            Self::BinaryOp(data) => {
                data.left.collect_filter_names(names);
                data.right.collect_filter_names(names);
            }
            Self::Conditional(data) => {
                data.condition.collect_filter_names(names);
                data.then_expr.collect_filter_names(names);
                data.else_expr.collect_filter_names(names);
            }
            Self::Pipe(data) => {
                data.input.collect_filter_names(names);
                names.push(&data.filter.name);
                for arg in &data.filter.args {
                    arg.collect_filter_names(names);
                }
            }
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => f.write_str(d),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Fully parenthesized rendering, used by diagnostics and `docmerge check`
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Identifier(name) => f.write_str(name),
            Self::This => f.write_str("this"),
            Self::Path { base, property } => write!(f, "{base}.{property}"),
            Self::Index { base, index } => write!(f, "{base}[{index}]"),
            Self::UnaryOp { op, operand } => write!(f, "{op}{operand}"),
            Self::BinaryOp(data) => write!(f, "({} {} {})", data.left, data.op, data.right),
            Self::Conditional(data) => write!(
                f,
                "({} ? {} : {})",
                data.condition, data.then_expr, data.else_expr
            ),
            Self::Pipe(data) => {
                write!(f, "({} | {}", data.input, data.filter.name)?;
                for arg in &data.filter.args {
                    write!(f, ":{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
