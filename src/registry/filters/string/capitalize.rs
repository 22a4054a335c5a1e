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


//! capitalize filter

use crate::registry::filters::input_text;
use crate::registry::{FilterResult, TemplateFilter};
use serde_json::Value;

/// `capitalize` - first character upper case, the rest lower case
pub struct CapitalizeFilter;

impl TemplateFilter for CapitalizeFilter {
    fn name(&self) -> &str {
        "capitalize"
    }

    fn documentation(&self) -> &str {
        "Upper-cases the first character and lower-cases the remainder."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        let text = input_text(input);
        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            return Ok(Value::String(text));
        };
        let mut result: String = first.to_uppercase().collect();
        result.push_str(&chars.as_str().to_lowercase());
        Ok(Value::String(result))
    }
}
