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


//! Property path resolution

use super::scope::Scope;
use crate::ast::{ExpressionNode, LiteralValue, UnaryOperator};
use crate::model::ValueExt;
use serde_json::Value;
use std::borrow::Cow;

/// Key used to access a member of a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKey<'k> {
    /// Property name (or string key in brackets)
    Name(Cow<'k, str>),
    /// Integer index
    Index(i64),
}

impl<'k> MemberKey<'k> {
    /// Key for a computed bracket access
    pub fn from_value(key: &'k Value) -> MemberKey<'k> {
        match key {
            Value::String(s) => MemberKey::Name(Cow::Borrowed(s.as_str())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MemberKey::Index(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        MemberKey::Index(f as i64)
                    }
                    _ => MemberKey::Name(Cow::Owned(key.to_display_string())),
                },
            },
            other => MemberKey::Name(Cow::Owned(other.to_display_string())),
        }
    }

    fn as_index(&self) -> Option<i64> {
        match self {
            MemberKey::Index(i) => Some(*i),
            MemberKey::Name(name) => canonical_index(name),
        }
    }
}

/// Integer keys written as strings ("0", "12"), without sign or leading zeros
fn canonical_index(name: &str) -> Option<i64> {
    let canonical = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_digit())
        && (name == "0" || !name.starts_with('0'));
    if canonical { name.parse().ok() } else { None }
}

/// Member lookup that can stay borrowed (object keys, array elements)
fn member_ref<'v>(base: &'v Value, key: &MemberKey<'_>) -> Option<&'v Value> {
    match base {
        Value::Object(map) => match key {
            MemberKey::Name(name) => map.get(&**name),
            MemberKey::Index(i) => map.get(&i.to_string()),
        },
        Value::Array(items) => key
            .as_index()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Access a member of `base`
///
/// Objects are indexed by key, sequences by integer and strings by character.
/// `length` is available on sequences and strings. Anything else is `null`.
pub fn get_member(base: &Value, key: &MemberKey<'_>) -> Value {
    if let Some(value) = member_ref(base, key) {
        return value.clone();
    }
    match (base, key) {
        (Value::Array(items), MemberKey::Name(name)) if name == "length" => {
            Value::from(items.len())
        }
        (Value::String(s), MemberKey::Name(name)) if name == "length" => {
            Value::from(s.chars().count())
        }
        (Value::String(s), key) => key
            .as_index()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// One navigation step of a static property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name` or `['name']`
    Property(String),
    /// `[3]`
    Index(i64),
}

impl PathSegment {
    fn key(&self) -> MemberKey<'_> {
        match self {
            PathSegment::Property(name) => MemberKey::Name(Cow::Borrowed(name)),
            PathSegment::Index(i) => MemberKey::Index(*i),
        }
    }
}

/// A root identifier followed by literal member accesses (`a.b[0]['c']`)
///
/// Such chains are resolved by walking borrowed references and cloning only
/// the value at the end of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    /// Identifier looked up through the scope chain
    pub root: String,
    /// Members navigated from the root value
    pub segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Extract a static path from an expression, if it is one
    pub fn from_node(node: &ExpressionNode) -> Option<Self> {
        match node {
            ExpressionNode::Identifier(name) => Some(Self {
                root: name.clone(),
                segments: Vec::new(),
            }),
            ExpressionNode::This => Some(Self {
                root: "$this".to_string(),
                segments: Vec::new(),
            }),
            ExpressionNode::Path { base, property } => {
                let mut path = Self::from_node(base)?;
                path.segments.push(PathSegment::Property(property.clone()));
                Some(path)
            }
            ExpressionNode::Index { base, index } => {
                let segment = match index.as_ref() {
                    ExpressionNode::Literal(LiteralValue::Integer(i)) => PathSegment::Index(*i),
                    // `[-1]` parses as a negation of the literal
                    ExpressionNode::UnaryOp {
                        op: UnaryOperator::Negate,
                        operand,
                    } => match operand.as_ref() {
                        ExpressionNode::Literal(LiteralValue::Integer(i)) => {
                            PathSegment::Index(i.checked_neg()?)
                        }
                        _ => return None,
                    },
                    ExpressionNode::Literal(LiteralValue::String(s)) => {
                        PathSegment::Property(s.clone())
                    }
                    _ => return None,
                };
                let mut path = Self::from_node(base)?;
                path.segments.push(segment);
                Some(path)
            }
            _ => None,
        }
    }

    /// Resolve the path against a scope; absent values are `null`
    pub fn resolve(&self, scope: &Scope<'_>) -> Value {
        let Some(mut current) = scope.lookup(&self.root) else {
            return Value::Null;
        };
        for (position, segment) in self.segments.iter().enumerate() {
            let key = segment.key();
            match member_ref(current, &key) {
                Some(next) => current = next,
                None => {
                    // computed members (length, characters) are owned from here on
                    let mut value = get_member(current, &key);
                    for rest in &self.segments[position + 1..] {
                        value = get_member(&value, &rest.key());
                    }
                    return value;
                }
            }
        }
        current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn path(source: &str) -> PropertyPath {
        PropertyPath::from_node(&parse(source).unwrap()).unwrap()
    }

    #[test]
    fn test_static_paths() {
        let p = path("customer.address[0]['zip']");
        assert_eq!(p.root, "customer");
        assert_eq!(
            p.segments,
            vec![
                PathSegment::Property("address".into()),
                PathSegment::Index(0),
                PathSegment::Property("zip".into()),
            ]
        );
        assert_eq!(path("list[-1]").segments, vec![PathSegment::Index(-1)]);
        assert!(PropertyPath::from_node(&parse("a[b]").unwrap()).is_none());
        assert!(PropertyPath::from_node(&parse("a[-b]").unwrap()).is_none());
        assert!(PropertyPath::from_node(&parse("a + b").unwrap()).is_none());
    }

    #[test]
    fn test_resolution_returns_stored_value() {
        let data = json!({
            "customer": {"address": [{"zip": "75001"}], "tags": ["x", "y"]},
            "other": 1
        });
        let scope = Scope::root(&data);
        assert_eq!(path("customer.address[0]['zip']").resolve(&scope), json!("75001"));
        assert_eq!(path("customer.tags").resolve(&scope), json!(["x", "y"]));
        assert_eq!(path("customer.tags.length").resolve(&scope), json!(2));
        assert_eq!(path("customer.tags[1].length").resolve(&scope), json!(1));
    }

    #[test]
    fn test_absent_values_are_null() {
        let data = json!({"a": {"b": null}, "list": [1]});
        let scope = Scope::root(&data);
        assert_eq!(path("missing.deep.path").resolve(&scope), Value::Null);
        assert_eq!(path("a.b.c").resolve(&scope), Value::Null);
        assert_eq!(path("list[5]").resolve(&scope), Value::Null);
        assert_eq!(path("list[-1]").resolve(&scope), Value::Null);
    }

    #[test]
    fn test_member_keys() {
        let data = json!({"1": "one", "items": ["a", "b"]});
        assert_eq!(get_member(&data, &MemberKey::Index(1)), json!("one"));
        assert_eq!(
            get_member(&data["items"], &MemberKey::Name("1".into())),
            json!("b")
        );
        assert_eq!(
            get_member(&data["items"], &MemberKey::Name("01".into())),
            Value::Null
        );
        assert_eq!(get_member(&json!("héllo"), &MemberKey::Index(1)), json!("é"));
        assert_eq!(MemberKey::from_value(&json!(2.0)), MemberKey::Index(2));
    }
}
