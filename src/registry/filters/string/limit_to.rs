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


//! limitTo filter

use crate::model::ValueExt;
use crate::registry::filters::{argument, input_text};
use crate::registry::{FilterResult, TemplateFilter};
use serde_json::Value;

/// `limitTo:n` - keep the first `n` characters of the string form
///
/// `n` is floored and clamped to zero; a missing or non-numeric `n` keeps nothing.
pub struct LimitToFilter;

impl TemplateFilter for LimitToFilter {
    fn name(&self) -> &str {
        "limitTo"
    }

    fn documentation(&self) -> &str {
        "Truncates the value's text to the first n characters."
    }

    fn apply(&self, input: &Value, args: &[Value]) -> FilterResult<Value> {
        let limit = argument(args, 0)
            .and_then(|n| n.to_number())
            .map(|n| n.floor().max(0.0))
            .unwrap_or(0.0);
        let text = input_text(input);
        // saturating float to int conversion keeps huge limits intact
        let limit = limit as usize;
        Ok(Value::String(text.chars().take(limit).collect()))
    }
}
