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


//! Numeric filters and locale-aware number formatting

mod currency;
mod fixed;
mod flexible;

pub use currency::CurrencyFilter;
pub use fixed::NumberFilter;
pub use flexible::NumflexFilter;

use crate::registry::NumberLocale;
use crate::registry::filters::input_text;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

/// Largest number of fraction digits any numeric filter renders
pub const MAX_FRACTION_DIGITS: u32 = 20;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
});

/// Parse the leading number of a value the way `parseFloat` does (`"12kg"` is 12)
pub fn parse_float(input: &Value) -> Option<f64> {
    match input {
        Value::Number(n) => n.as_f64(),
        Value::Null | Value::Bool(_) => None,
        other => {
            let text = input_text(other);
            let trimmed = text.trim_start();
            let matched = FLOAT_PREFIX.find(trimmed)?;
            matched.as_str().parse::<f64>().ok().filter(|f| f.is_finite())
        }
    }
}

/// Format `value` with digit grouping and between `min_fraction` and
/// `max_fraction` fraction digits, rounding half away from zero
pub fn format_number(
    value: f64,
    min_fraction: u32,
    max_fraction: u32,
    locale: &NumberLocale,
) -> String {
    let max_fraction = max_fraction.min(MAX_FRACTION_DIGITS);
    let min_fraction = min_fraction.min(max_fraction);
    let digits = round_to_digits(value, max_fraction);

    let (negative, unsigned) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits.as_str()),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut fraction = fraction.to_string();
    while fraction.len() > min_fraction as usize && fraction.ends_with('0') {
        fraction.pop();
    }
    while fraction.len() < min_fraction as usize {
        fraction.push('0');
    }

    let is_zero = integer.bytes().chain(fraction.bytes()).all(|b| b == b'0');
    let mut out = String::with_capacity(digits.len() + 8);
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(integer, &locale.grouping_separator));
    if !fraction.is_empty() {
        out.push_str(&locale.decimal_separator);
        out.push_str(&fraction);
    }
    out
}

/// Plain decimal text of `value` rounded to at most `places` fraction digits
fn round_to_digits(value: f64, places: u32) -> String {
    // Display gives the shortest round-trip text, so 1.005 rounds as written
    match Decimal::from_str(&value.to_string()) {
        Ok(decimal) => decimal
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
            .to_string(),
        Err(_) => format!("{:.*}", places as usize, value),
    }
}

fn group_digits(integer: &str, separator: &str) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Result of a numeric filter whose input did not parse: the original text
pub(crate) fn unparsed(input: &Value) -> Value {
    Value::String(input_text(input))
}
