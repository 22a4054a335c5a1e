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


//! AST to closure compiler

use super::error::{CompileError, CompileResult};
use crate::ast::{BinaryOperator, ExpressionNode, LiteralValue};
use crate::evaluator::operators::{apply_binary, apply_unary};
use crate::evaluator::{EvaluationResult, MemberKey, PropertyPath, Scope, get_member};
use crate::model::{ValueExt, number_value};
use crate::parser::parse_expression;
use crate::registry::FilterRegistry;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Evaluation closure produced by the compiler
pub type EvalFn = dyn Fn(&Scope<'_>) -> EvaluationResult<Value> + Send + Sync;

fn boxed<F>(f: F) -> Box<EvalFn>
where
    F: Fn(&Scope<'_>) -> EvaluationResult<Value> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A compiled placeholder expression, cheap to clone and share
#[derive(Clone)]
pub struct CompiledExpression {
    source: Arc<str>,
    ast: Arc<ExpressionNode>,
    eval: Arc<EvalFn>,
}

impl CompiledExpression {
    /// Expression text it was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed form of the expression
    pub fn ast(&self) -> &ExpressionNode {
        &self.ast
    }

    /// Evaluate against a scope
    pub fn evaluate(&self, scope: &Scope<'_>) -> EvaluationResult<Value> {
        (self.eval)(scope)
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("ast", &self.ast)
            .finish()
    }
}

/// Turns expressions into [`CompiledExpression`]s, resolving filters from a registry
pub struct ExpressionCompiler<'r> {
    registry: &'r FilterRegistry,
}

impl<'r> ExpressionCompiler<'r> {
    /// Create a compiler bound to `registry`
    pub fn new(registry: &'r FilterRegistry) -> Self {
        Self { registry }
    }

    /// Parse and compile expression text
    pub fn compile_source(&self, source: &str) -> CompileResult<CompiledExpression> {
        let ast = parse_expression(source)?;
        self.compile(source, ast)
    }

    /// Compile an already parsed expression
    pub fn compile(&self, source: &str, ast: ExpressionNode) -> CompileResult<CompiledExpression> {
        let eval = self.compile_node(&ast)?;
        Ok(CompiledExpression {
            source: Arc::from(source),
            ast: Arc::new(ast),
            eval: Arc::from(eval),
        })
    }

    fn compile_node(&self, node: &ExpressionNode) -> CompileResult<Box<EvalFn>> {
        if let Some(path) = PropertyPath::from_node(node) {
            return Ok(boxed(move |scope| Ok(path.resolve(scope))));
        }

        let eval = match node {
            ExpressionNode::Literal(literal) => {
                let value = literal_value(literal);
                boxed(move |_| Ok(value.clone()))
            }
            ExpressionNode::Path { base, property } => {
                let base = self.compile_node(base)?;
                let property = property.clone();
                boxed(move |scope| {
                    let value = base(scope)?;
                    Ok(get_member(&value, &MemberKey::Name(Cow::Borrowed(property.as_str()))))
                })
            }
            ExpressionNode::Index { base, index } => {
                let base = self.compile_node(base)?;
                let index = self.compile_node(index)?;
                boxed(move |scope| {
                    let value = base(scope)?;
                    let key = index(scope)?;
                    Ok(get_member(&value, &MemberKey::from_value(&key)))
                })
            }
            ExpressionNode::UnaryOp { op, operand } => {
                let op = *op;
                let operand = self.compile_node(operand)?;
                boxed(move |scope| apply_unary(op, operand(scope)?))
            }
            ExpressionNode::BinaryOp(data) => {
                let left = self.compile_node(&data.left)?;
                let right = self.compile_node(&data.right)?;
                match data.op {
                    BinaryOperator::And => boxed(move |scope| {
                        let value = left(scope)?;
                        if value.is_truthy() { right(scope) } else { Ok(value) }
                    }),
                    BinaryOperator::Or => boxed(move |scope| {
                        let value = left(scope)?;
                        if value.is_truthy() { Ok(value) } else { right(scope) }
                    }),
                    op => boxed(move |scope| apply_binary(op, left(scope)?, right(scope)?)),
                }
            }
            ExpressionNode::Conditional(data) => {
                let condition = self.compile_node(&data.condition)?;
                let then_expr = self.compile_node(&data.then_expr)?;
                let else_expr = self.compile_node(&data.else_expr)?;
                boxed(move |scope| {
                    if condition(scope)?.is_truthy() {
                        then_expr(scope)
                    } else {
                        else_expr(scope)
                    }
                })
            }
            ExpressionNode::Pipe(data) => {
                let name = &data.filter.name;
                let filter = self
                    .registry
                    .get(name)
                    .ok_or_else(|| CompileError::UnknownFilter { name: name.clone() })?;
                let input = self.compile_node(&data.input)?;
                let args = data
                    .filter
                    .args
                    .iter()
                    .map(|arg| self.compile_node(arg))
                    .collect::<CompileResult<Vec<_>>>()?;
                boxed(move |scope| {
                    let value = input(scope)?;
                    let args = args
                        .iter()
                        .map(|arg| arg(scope))
                        .collect::<EvaluationResult<SmallVec<[Value; 2]>>>()?;
                    Ok(filter.apply(&value, &args)?)
                })
            }
            ExpressionNode::Identifier(name) => {
                let name = name.clone();
                boxed(move |scope| Ok(scope.lookup(&name).cloned().unwrap_or(Value::Null)))
            }
            ExpressionNode::This => boxed(|scope| Ok(scope.context().clone())),
        };
        Ok(eval)
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Null => Value::Null,
        LiteralValue::Boolean(b) => Value::Bool(*b),
        LiteralValue::Integer(i) => Value::from(*i),
        LiteralValue::Decimal(text) => text
            .parse::<f64>()
            .ok()
            .and_then(number_value)
            .unwrap_or(Value::Null),
        LiteralValue::String(s) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval(source: &str, data: &Value) -> EvaluationResult<Value> {
        let registry = FilterRegistry::default();
        let compiled = ExpressionCompiler::new(&registry)
            .compile_source(source)
            .unwrap_or_else(|e| panic!("{source}: {e}"));
        compiled.evaluate(&Scope::root(data))
    }

    fn sample() -> Value {
        json!({
            "name": "ada lovelace",
            "qty": 3,
            "price": 2.5,
            "items": [{"label": "a"}, {"label": "b"}],
            "key": "label",
            "flag": false,
            "born": "1815-12-10"
        })
    }

    #[test]
    fn test_paths_and_literals() {
        let data = sample();
        assert_eq!(eval("name", &data).unwrap(), json!("ada lovelace"));
        assert_eq!(eval("items[1].label", &data).unwrap(), json!("b"));
        assert_eq!(eval("items[0][key]", &data).unwrap(), json!("a"));
        assert_eq!(eval("items[qty - 2].label", &data).unwrap(), json!("b"));
        assert_eq!(eval("'x'", &data).unwrap(), json!("x"));
        assert_eq!(eval("1.5", &data).unwrap(), json!(1.5));
        assert_eq!(eval("null", &data).unwrap(), Value::Null);
        assert_eq!(eval(".", &data).unwrap(), data);
    }

    #[test]
    fn test_operators() {
        let data = sample();
        assert_eq!(eval("qty * price", &data).unwrap(), json!(7.5));
        assert_eq!(eval("qty + 1 + '!'", &data).unwrap(), json!("4!"));
        assert_eq!(eval("qty > 2 ? 'many' : 'few'", &data).unwrap(), json!("many"));
        assert_eq!(eval("flag || 'default'", &data).unwrap(), json!("default"));
        assert_eq!(eval("!flag && qty", &data).unwrap(), json!(3));
        assert_eq!(eval("-qty", &data).unwrap(), json!(-3));
        assert_eq!(eval("items.length == 2", &data).unwrap(), json!(true));
    }

    #[test]
    fn test_short_circuit_skips_failing_branch() {
        let data = sample();
        assert_eq!(eval("flag && 1 / 0", &data).unwrap(), json!(false));
        assert_eq!(eval("qty || 1 / 0", &data).unwrap(), json!(3));
        assert_eq!(eval("qty ? 'ok' : 1 / 0", &data).unwrap(), json!("ok"));
    }

    #[test]
    fn test_filters() {
        let data = sample();
        assert_eq!(eval("name | capitalize", &data).unwrap(), json!("Ada lovelace"));
        assert_eq!(eval("name | upper | limitTo:3", &data).unwrap(), json!("ADA"));
        assert_eq!(eval("price * 1000 | number:2", &data).unwrap(), json!("2,500.00"));
        assert_eq!(eval("born | date:'yyyy'", &data).unwrap(), json!("1815"));
    }

    #[test]
    fn test_absent_root_renders_empty() {
        let data = sample();
        assert_eq!(eval("missing.deep", &data).unwrap(), Value::Null);
        assert_eq!(eval("missing | upper", &data).unwrap(), json!(""));
        assert_eq!(eval("missing + ''", &data).unwrap(), json!(""));
        assert_eq!(eval("missing.deep | number:2", &data).unwrap(), json!(""));
        assert_eq!(eval("missing * 2", &data).unwrap(), Value::Null);
        assert_eq!(eval("missing.a / missing.b", &data).unwrap(), Value::Null);
        assert_eq!(eval("qty - missing.a", &data).unwrap(), Value::Null);
    }

    #[test]
    fn test_evaluation_errors() {
        let data = sample();
        assert!(matches!(
            eval("qty / 0", &data),
            Err(EvaluationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval("qty | number:'many'", &data),
            Err(EvaluationError::Filter(_))
        ));
    }

    #[test]
    fn test_unknown_filter_is_compile_error() {
        let registry = FilterRegistry::default();
        let result = ExpressionCompiler::new(&registry).compile_source("name | shout");
        assert_eq!(
            result.unwrap_err(),
            CompileError::UnknownFilter {
                name: "shout".to_string()
            }
        );
    }

    #[test]
    fn test_syntax_error() {
        let registry = FilterRegistry::default();
        let result = ExpressionCompiler::new(&registry).compile_source("a +");
        assert!(matches!(result, Err(CompileError::Parse(_))));
    }

    #[test]
    fn test_custom_filter_receives_arguments() {
        let registry = FilterRegistry::default();
        registry.register_fn("wrap", |input, args| {
            let left = args.first().map(|v| v.to_display_string()).unwrap_or_default();
            let right = args.get(1).map(|v| v.to_display_string()).unwrap_or_default();
            Ok(json!(format!("{left}{}{right}", input.to_display_string())))
        });
        let compiled = ExpressionCompiler::new(&registry)
            .compile_source("qty | wrap:'[':']'")
            .unwrap();
        let data = sample();
        assert_eq!(compiled.evaluate(&Scope::root(&data)).unwrap(), json!("[3]"));
        assert_eq!(compiled.source(), "qty | wrap:'[':']'");
    }
}
