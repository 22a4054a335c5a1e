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

//! Loose, JavaScript-flavoured conversions on JSON values

use serde_json::{Number, Value};

/// Conversions used when values are rendered, compared or tested for truth
pub trait ValueExt {
    /// Text rendered into the document for this value
    ///
    /// `null` renders empty, whole numbers render without a fraction,
    /// sequences join their elements with `,` and objects render as compact JSON.
    fn to_display_string(&self) -> String;

    /// Truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy
    fn is_truthy(&self) -> bool;

    /// `null` or an object without keys; filters render these as empty text
    fn is_blank(&self) -> bool;

    /// Whether an inverted section should render for this value
    fn is_empty_section(&self) -> bool;

    /// Numeric coercion (`Number(x)` semantics); `None` when not numeric
    fn to_number(&self) -> Option<f64>;

    /// Short type name for diagnostics
    fn type_name(&self) -> &'static str;
}

impl ValueExt for Value {
    fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(ValueExt::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    fn is_empty_section(&self) -> bool {
        match self {
            Value::Array(items) => items.is_empty(),
            other => !other.is_truthy(),
        }
    }

    fn to_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Some(0.0);
                }
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    // f64 Display is the shortest round-trip form and never uses an exponent
    n.as_f64().map(|f| f.to_string()).unwrap_or_default()
}

/// Wrap an arithmetic result as a JSON number
///
/// Whole results inside the exactly-representable integer range are stored as
/// integers so they render without a fraction. Non-finite results yield `None`.
pub fn number_value(result: f64) -> Option<Value> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if !result.is_finite() {
        return None;
    }
    if result.fract() == 0.0 && result.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(result as i64));
    }
    Number::from_f64(result).map(Value::Number)
}
