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


//! Operator semantics
//!
//! Operators follow the loose typing of the placeholder language: `+`
//! concatenates as soon as a string is involved, comparisons never fail and
//! any other arithmetic on `null` yields `null`, so an absent path renders empty.

use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{BinaryOperator, UnaryOperator};
use crate::model::{ValueExt, number_value};
use serde_json::Value;
use std::cmp::Ordering;

/// Apply a non-logical binary operator to two evaluated operands
///
/// `&&` and `||` short-circuit and are handled by the compiler; passing them
/// here evaluates both sides eagerly with the same result.
pub fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> EvaluationResult<Value> {
    use BinaryOperator::*;

    match op {
        Add => add(left, right),
        Subtract | Multiply | Divide | Modulo => arithmetic(op, &left, &right),
        Equal => Ok(Value::Bool(loose_equals(&left, &right))),
        NotEqual => Ok(Value::Bool(!loose_equals(&left, &right))),
        StrictEqual => Ok(Value::Bool(strict_equals(&left, &right))),
        StrictNotEqual => Ok(Value::Bool(!strict_equals(&left, &right))),
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(Value::Bool(compare(op, &left, &right)))
        }
        And => Ok(if left.is_truthy() { right } else { left }),
        Or => Ok(if left.is_truthy() { left } else { right }),
    }
}

/// Apply a unary operator
pub fn apply_unary(op: UnaryOperator, operand: Value) -> EvaluationResult<Value> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        _ if operand.is_null() => Ok(Value::Null),
        UnaryOperator::Negate | UnaryOperator::Positive => {
            let number = numeric_operand(&operand).ok_or_else(|| {
                EvaluationError::InvalidUnaryOperand {
                    operator: op.symbol().into(),
                    operand: operand.to_string(),
                }
            })?;
            let result = if op == UnaryOperator::Negate { -number } else { number };
            finite(op.symbol(), result)
        }
    }
}

/// `+`: string concatenation when either side is textual, numeric addition otherwise
pub fn add(left: Value, right: Value) -> EvaluationResult<Value> {
    match (&left, &right) {
        (Value::Null, _) => return Ok(right),
        (_, Value::Null) => return Ok(left),
        _ => {}
    }
    if is_textual(&left) || is_textual(&right) {
        let mut text = left.to_display_string();
        text.push_str(&right.to_display_string());
        return Ok(Value::String(text));
    }
    match (numeric_operand(&left), numeric_operand(&right)) {
        (Some(l), Some(r)) => finite("+", l + r),
        _ => Err(EvaluationError::invalid_operand("+", &left, &right)),
    }
}

/// `-`, `*`, `/` and `%`
pub fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (Some(l), Some(r)) = (numeric_operand(left), numeric_operand(right)) else {
        return Err(EvaluationError::invalid_operand(op.symbol(), left, right));
    };
    let result = match op {
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide | BinaryOperator::Modulo if r == 0.0 => {
            return Err(EvaluationError::DivisionByZero {
                operator: op.symbol().into(),
            });
        }
        BinaryOperator::Divide => l / r,
        BinaryOperator::Modulo => l % r,
        other => return apply_binary(other, left.clone(), right.clone()),
    };
    finite(op.symbol(), result)
}

/// Loose equality (`==`): numbers, numeric strings and booleans compare by value
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => left == right,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            left.to_display_string() == right.to_display_string()
        }
        _ => match (left.to_number(), right.to_number()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}

/// Strict equality (`===`): same type and same value
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => left == right,
    }
}

/// Relational comparison; incomparable operands compare false
pub fn compare(op: BinaryOperator, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => match (numeric_operand(left), numeric_operand(right)) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => None,
        },
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        _ => false,
    }
}

fn is_textual(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

/// Numeric view of an operand; `null` is zero
fn numeric_operand(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        other => other.to_number(),
    }
}

fn finite(operator: &'static str, result: f64) -> EvaluationResult<Value> {
    number_value(result).ok_or(EvaluationError::NonFiniteNumber {
        operator: operator.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_addition_and_concatenation() {
        assert_eq!(add(json!(1), json!(2)).unwrap(), json!(3));
        assert_eq!(add(json!(0.1), json!(0.2)).unwrap(), json!(0.30000000000000004));
        assert_eq!(add(json!("a"), json!(1)).unwrap(), json!("a1"));
        assert_eq!(add(json!(1), json!("1")).unwrap(), json!("11"));
        assert_eq!(add(Value::Null, json!("x")).unwrap(), json!("x"));
        assert_eq!(add(json!(5), Value::Null).unwrap(), json!(5));
        assert_eq!(add(json!(true), json!(1)).unwrap(), json!(2));
    }

    #[test]
    fn test_arithmetic() {
        use BinaryOperator::*;
        assert_eq!(arithmetic(Subtract, &json!(5), &json!(2)).unwrap(), json!(3));
        assert_eq!(arithmetic(Multiply, &json!("4"), &json!(2.5)).unwrap(), json!(10));
        assert_eq!(arithmetic(Divide, &json!(7), &json!(2)).unwrap(), json!(3.5));
        assert_eq!(arithmetic(Modulo, &json!(-7), &json!(3)).unwrap(), json!(-1));
    }

    #[test]
    fn test_arithmetic_on_null_yields_null() {
        use BinaryOperator::*;
        assert_eq!(arithmetic(Subtract, &Value::Null, &json!(2)).unwrap(), Value::Null);
        assert_eq!(arithmetic(Multiply, &Value::Null, &json!(2)).unwrap(), Value::Null);
        assert_eq!(arithmetic(Divide, &Value::Null, &Value::Null).unwrap(), Value::Null);
        assert_eq!(arithmetic(Modulo, &json!(1), &Value::Null).unwrap(), Value::Null);
        assert_eq!(apply_unary(UnaryOperator::Negate, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_arithmetic_errors() {
        use BinaryOperator::*;
        assert!(matches!(
            arithmetic(Divide, &json!(1), &json!(0)),
            Err(EvaluationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            arithmetic(Modulo, &json!(1), &json!("")),
            Err(EvaluationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            arithmetic(Multiply, &json!("abc"), &json!(2)),
            Err(EvaluationError::InvalidOperand { .. })
        ));
        assert!(matches!(
            apply_unary(UnaryOperator::Negate, json!({"a": 1})),
            Err(EvaluationError::InvalidUnaryOperand { .. })
        ));
    }

    #[test]
    fn test_equality() {
        assert!(loose_equals(&json!(1), &json!("1")));
        assert!(loose_equals(&json!(1), &json!(1.0)));
        assert!(loose_equals(&json!(true), &json!(1)));
        assert!(loose_equals(&Value::Null, &Value::Null));
        assert!(!loose_equals(&Value::Null, &json!(0)));
        assert!(!loose_equals(&json!("a"), &json!("b")));
        assert!(strict_equals(&json!(1), &json!(1.0)));
        assert!(!strict_equals(&json!(1), &json!("1")));
    }

    #[test]
    fn test_comparison() {
        use BinaryOperator::*;
        assert!(compare(LessThan, &json!(2), &json!(10)));
        assert!(compare(GreaterThan, &json!("b"), &json!("a")));
        assert!(compare(LessThan, &json!("2"), &json!(10)));
        assert!(compare(GreaterThanOrEqual, &json!(3), &json!(3)));
        assert!(!compare(LessThan, &json!("abc"), &json!(1)));
        assert!(!compare(GreaterThan, &json!({"a": 1}), &json!(1)));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        use BinaryOperator::*;
        assert_eq!(apply_binary(Or, Value::Null, json!("fallback")).unwrap(), json!("fallback"));
        assert_eq!(apply_binary(And, json!("x"), json!(0)).unwrap(), json!(0));
        assert_eq!(apply_unary(UnaryOperator::Not, json!("")).unwrap(), json!(true));
    }
}
