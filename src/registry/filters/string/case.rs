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


//! upper / lower filters

use crate::registry::filters::input_text;
use crate::registry::{FilterResult, TemplateFilter};
use serde_json::Value;

/// `upper` - uppercase the string form of the value
pub struct UpperFilter;

impl TemplateFilter for UpperFilter {
    fn name(&self) -> &str {
        "upper"
    }

    fn documentation(&self) -> &str {
        "Converts the value's text to upper case."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        Ok(Value::String(input_text(input).to_uppercase()))
    }
}

/// `lower` - lowercase the string form of the value
pub struct LowerFilter;

impl TemplateFilter for LowerFilter {
    fn name(&self) -> &str {
        "lower"
    }

    fn documentation(&self) -> &str {
        "Converts the value's text to lower case."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        Ok(Value::String(input_text(input).to_lowercase()))
    }
}
