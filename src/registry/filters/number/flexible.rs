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


//! numflex filter

use super::{MAX_FRACTION_DIGITS, format_number, parse_float, unparsed};
use crate::registry::{FilterResult, NumberLocale, TemplateFilter};
use serde_json::Value;

/// `numflex` - grouped number keeping only the fraction digits it needs
pub struct NumflexFilter {
    locale: NumberLocale,
}

impl NumflexFilter {
    /// Filter formatting for `locale`
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }
}

impl TemplateFilter for NumflexFilter {
    fn name(&self) -> &str {
        "numflex"
    }

    fn documentation(&self) -> &str {
        "Formats a number with digit grouping and only the fraction digits it needs."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        Ok(match parse_float(input) {
            Some(value) => {
                Value::String(format_number(value, 0, MAX_FRACTION_DIGITS, &self.locale))
            }
            None => unparsed(input),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(100), "100")]
    #[case(json!(100.0), "100")]
    #[case(json!(100.5), "100.5")]
    #[case(json!(1234.5678), "1,234.5678")]
    #[case(json!(0.000123), "0.000123")]
    #[case(json!("2500.250"), "2,500.25")]
    #[case(json!("abc"), "abc")]
    fn test_numflex(#[case] input: Value, #[case] expected: &str) {
        let filter = NumflexFilter::new(NumberLocale::en_us());
        assert_eq!(filter.apply(&input, &[]).unwrap(), json!(expected));
    }

    #[test]
    fn test_numflex_french() {
        let filter = NumflexFilter::new(NumberLocale::fr_fr());
        assert_eq!(filter.apply(&json!(1234.5), &[]).unwrap(), json!("1\u{202F}234,5"));
    }
}
