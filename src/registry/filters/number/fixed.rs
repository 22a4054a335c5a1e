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


//! number filter

use super::{MAX_FRACTION_DIGITS, format_number, parse_float, unparsed};
use crate::model::ValueExt;
use crate::registry::filters::argument;
use crate::registry::{FilterError, FilterResult, NumberLocale, TemplateFilter};
use serde_json::Value;

/// `number:frac` - grouped number with exactly `frac` fraction digits (default 0)
pub struct NumberFilter {
    locale: NumberLocale,
}

impl NumberFilter {
    /// Filter formatting for `locale`
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    fn fraction_digits(&self, args: &[Value]) -> FilterResult<u32> {
        let Some(arg) = argument(args, 0) else {
            return Ok(0);
        };
        let digits = arg.to_number().map(f64::floor).ok_or_else(|| {
            FilterError::invalid_argument(
                "number",
                0,
                format!("fraction digits must be a number, got {arg}"),
            )
        })?;
        if !(0.0..=f64::from(MAX_FRACTION_DIGITS)).contains(&digits) {
            return Err(FilterError::invalid_argument(
                "number",
                0,
                format!("fraction digits must be between 0 and {MAX_FRACTION_DIGITS}, got {digits}"),
            ));
        }
        Ok(digits as u32)
    }
}

impl TemplateFilter for NumberFilter {
    fn name(&self) -> &str {
        "number"
    }

    fn documentation(&self) -> &str {
        "Formats a number with digit grouping and a fixed number of fraction digits."
    }

    fn apply(&self, input: &Value, args: &[Value]) -> FilterResult<Value> {
        let digits = self.fraction_digits(args)?;
        Ok(match parse_float(input) {
            Some(value) => Value::String(format_number(value, digits, digits, &self.locale)),
            None => unparsed(input),
        })
    }
}
