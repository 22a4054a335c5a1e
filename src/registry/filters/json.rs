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


//! json filter

use crate::model::ValueExt;
use crate::registry::{FilterResult, TemplateFilter};
use serde_json::Value;

/// `json` - pretty-printed JSON with two-space indentation
pub struct JsonFilter;

impl TemplateFilter for JsonFilter {
    fn name(&self) -> &str {
        "json"
    }

    fn documentation(&self) -> &str {
        "Dumps the value as indented JSON."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        if input.is_blank() {
            return Ok(Value::String(String::new()));
        }
        let text = serde_json::to_string_pretty(input).unwrap_or_else(|err| {
            log::debug!("json filter fell back to plain text: {err}");
            input.to_display_string()
        });
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pretty_dump() {
        let value = json!({"name": "Ada", "tags": ["a", "b"]});
        let rendered = JsonFilter.apply(&value, &[]).unwrap();
        assert_eq!(
            rendered.as_str().unwrap(),
            "{\n  \"name\": \"Ada\",\n  \"tags\": [\n    \"a\",\n    \"b\"\n  ]\n}"
        );
    }

    #[test]
    fn test_scalars_and_blank() {
        assert_eq!(JsonFilter.apply(&json!("x"), &[]).unwrap(), json!("\"x\""));
        assert_eq!(JsonFilter.apply(&json!(3), &[]).unwrap(), json!("3"));
        assert_eq!(JsonFilter.apply(&Value::Null, &[]).unwrap(), json!(""));
        assert_eq!(JsonFilter.apply(&json!({}), &[]).unwrap(), json!(""));
    }
}
