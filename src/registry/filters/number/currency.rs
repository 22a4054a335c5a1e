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


//! currency filter

use super::{format_number, parse_float, unparsed};
use crate::registry::{FilterResult, NumberLocale, SymbolPosition, TemplateFilter};
use serde_json::Value;

/// `currency` - amount in the locale's currency, at most two fraction digits
pub struct CurrencyFilter {
    locale: NumberLocale,
}

impl CurrencyFilter {
    /// Filter formatting for `locale`
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    fn decorate(&self, amount: String) -> String {
        let currency = &self.locale.currency;
        let (sign, digits) = match amount.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", amount.as_str()),
        };
        match currency.position {
            SymbolPosition::Prefix => {
                format!("{sign}{}{}{digits}", currency.symbol, currency.spacing)
            }
            SymbolPosition::Suffix => {
                format!("{sign}{digits}{}{}", currency.spacing, currency.symbol)
            }
        }
    }
}

impl TemplateFilter for CurrencyFilter {
    fn name(&self) -> &str {
        "currency"
    }

    fn documentation(&self) -> &str {
        "Formats a number as a currency amount in the configured locale."
    }

    fn apply(&self, input: &Value, _args: &[Value]) -> FilterResult<Value> {
        Ok(match parse_float(input) {
            Some(value) => Value::String(self.decorate(format_number(value, 0, 2, &self.locale))),
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
    #[case(NumberLocale::en_us(), json!(1234.5), "$1,234.5")]
    #[case(NumberLocale::en_us(), json!(1234.567), "$1,234.57")]
    #[case(NumberLocale::en_us(), json!(-12), "-$12")]
    #[case(NumberLocale::en_gb(), json!("99.999"), "£100")]
    #[case(NumberLocale::fr_fr(), json!(1234.5), "1\u{202F}234,5\u{00A0}€")]
    #[case(NumberLocale::de_de(), json!(-0.5), "-0,5\u{00A0}€")]
    #[case(NumberLocale::en_us(), json!("free"), "free")]
    fn test_currency(#[case] locale: NumberLocale, #[case] input: Value, #[case] expected: &str) {
        let filter = CurrencyFilter::new(locale);
        assert_eq!(filter.apply(&input, &[]).unwrap(), json!(expected));
    }
}
