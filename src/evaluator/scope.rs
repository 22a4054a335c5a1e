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


//! Hierarchical data scopes

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Name that always resolves to the scope's own context value
const THIS: &str = "$this";

/// Variables injected into every iteration of a repeating section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopVariable {
    /// 0-based position of the element
    Index,
    /// Number of elements in the sequence
    Total,
    /// Whether the element is the first one
    First,
    /// Whether the element is the last one
    Last,
}

impl LoopVariable {
    /// All loop variables, in injection order
    pub const ALL: [LoopVariable; 4] = [Self::Index, Self::Total, Self::First, Self::Last];

    /// Name used in expressions
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "$index",
            Self::Total => "$total",
            Self::First => "$first",
            Self::Last => "$last",
        }
    }

    fn value(self, index: usize, total: usize) -> Value {
        match self {
            Self::Index => Value::from(index),
            Self::Total => Value::from(total),
            Self::First => Value::Bool(index == 0),
            Self::Last => Value::Bool(index + 1 == total),
        }
    }
}

/// Data context an expression is evaluated against
///
/// A scope borrows its context value, so creating one per loop iteration
/// costs a handful of small allocations for the loop variables and never
/// copies the data. Lookups fall back to the parent, never the reverse.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    context: &'a Value,
    parent: Option<&'a Scope<'a>>,
    variables: FxHashMap<&'static str, Value>,
}

impl<'a> Scope<'a> {
    /// Top-level scope over the merge data
    pub fn root(context: &'a Value) -> Self {
        Self {
            context,
            parent: None,
            variables: FxHashMap::default(),
        }
    }

    /// Scope for one element of a repeating section
    pub fn child(parent: &'a Scope<'a>, element: &'a Value, index: usize, total: usize) -> Self {
        let variables = LoopVariable::ALL
            .iter()
            .map(|var| (var.name(), var.value(index, total)))
            .collect();
        Self {
            context: element,
            parent: Some(parent),
            variables,
        }
    }

    /// Value this scope exposes as its local context
    pub fn context(&self) -> &'a Value {
        self.context
    }

    /// Enclosing scope, if any
    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    /// Number of enclosing scopes
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent;
        }
        depth
    }

    /// Variable bound directly in this scope
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Resolve a root identifier
    ///
    /// Checks this scope's variables, then the keys of its context object, then
    /// the parent scopes. Returns `None` when no scope knows the name.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if name == THIS {
            return Some(self.context);
        }
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.variables.get(name) {
                return Some(value);
            }
            if let Some(value) = scope.context.as_object().and_then(|map| map.get(name)) {
                return Some(value);
            }
            current = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_lookup() {
        let data = json!({"name": "Ada", "nested": {"x": 1}});
        let scope = Scope::root(&data);
        assert_eq!(scope.lookup("name"), Some(&json!("Ada")));
        assert_eq!(scope.lookup("missing"), None);
        assert_eq!(scope.lookup("$this"), Some(&data));
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn test_child_falls_back_to_parent() {
        let data = json!({"company": "Acme", "items": [{"name": "a"}, {"name": "b"}]});
        let root = Scope::root(&data);
        let element = &data["items"][1];
        let child = Scope::child(&root, element, 1, 2);

        assert_eq!(child.lookup("name"), Some(&json!("b")));
        assert_eq!(child.lookup("company"), Some(&json!("Acme")));
        assert_eq!(child.lookup("$index"), Some(&json!(1)));
        assert_eq!(child.lookup("$total"), Some(&json!(2)));
        assert_eq!(child.lookup("$first"), Some(&json!(false)));
        assert_eq!(child.lookup("$last"), Some(&json!(true)));
        assert_eq!(child.lookup("$this"), Some(element));
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn test_parent_never_sees_child_keys() {
        let data = json!({"items": [{"inner": 1}]});
        let root = Scope::root(&data);
        let _child = Scope::child(&root, &data["items"][0], 0, 1);
        assert_eq!(root.lookup("inner"), None);
        assert_eq!(root.lookup("$index"), None);
    }

    #[test]
    fn test_local_key_shadows_parent() {
        let data = json!({"name": "outer", "rows": [{"name": "inner"}, "plain"]});
        let root = Scope::root(&data);
        let first = Scope::child(&root, &data["rows"][0], 0, 2);
        let second = Scope::child(&root, &data["rows"][1], 1, 2);
        assert_eq!(first.lookup("name"), Some(&json!("inner")));
        assert_eq!(second.lookup("name"), Some(&json!("outer")));
    }
}
