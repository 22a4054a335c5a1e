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


//! date filter
//!
//! Day-first input (`D/M/YYYY` or `D-M-YYYY`, optionally followed by a time)
//! is read with the first component as the day and the second as the month. This is ambiguous for days up to 12
//! (`03/04/2024` is always the 3rd of April) and is kept for compatibility with
//! existing templates.

use crate::registry::filters::{argument, input_text};
use crate::registry::{FilterResult, TemplateFilter};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Format used when the filter gets no argument
pub const DEFAULT_DATE_FORMAT: &str = "dd/MM/yyyy";

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})(?:[\sT].*)?$")
        .expect("valid day-first date regex")
});

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// `date:fmt` - reformat a date using `dd`, `MM` and `yyyy` tokens
pub struct DateFilter;

impl TemplateFilter for DateFilter {
    fn name(&self) -> &str {
        "date"
    }

    fn documentation(&self) -> &str {
        "Formats a date with dd, MM and yyyy tokens (default dd/MM/yyyy)."
    }

    fn apply(&self, input: &Value, args: &[Value]) -> FilterResult<Value> {
        let Some(date) = parse_date(input) else {
            return Ok(Value::String(input_text(input)));
        };
        let format = argument(args, 0)
            .map(input_text)
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        Ok(Value::String(format_date(date, &format)))
    }
}

/// Interpret a value as a calendar date
///
/// Numbers are milliseconds since the Unix epoch (UTC). Strings are tried as
/// day-first dates, then ISO 8601 / RFC 3339 dates and date-times.
pub fn parse_date(input: &Value) -> Option<NaiveDate> {
    match input {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        Value::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DAY_FIRST.captures(text) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Render `date` by replacing `yyyy`, `MM` and `dd`; other text is copied
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut rest = format;
    while let Some(ch) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("yyyy") {
            out.push_str(&format!("{:04}", date.year()));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("MM") {
            out.push_str(&format!("{:02}", date.month()));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("dd") {
            out.push_str(&format!("{:02}", date.day()));
            rest = tail;
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("2024-01-05"), None, "05/01/2024")]
    #[case(json!("2024-01-05"), Some("yyyy-MM-dd"), "2024-01-05")]
    #[case(json!("2024-01-05T10:30:00Z"), Some("MM/dd/yyyy"), "01/05/2024")]
    #[case(json!("2024-01-05T10:30:00.123"), None, "05/01/2024")]
    #[case(json!("2024-01-05 23:59:59"), None, "05/01/2024")]
    #[case(json!("25/12/2023"), None, "25/12/2023")]
    #[case(json!("5-3-2024"), Some("yyyy.MM.dd"), "2024.03.05")]
    #[case(json!("05/01/2024 10:30"), Some("yyyy-MM-dd"), "2024-01-05")]
    #[case(json!(" 03/04/2024 "), Some("MM"), "04")]
    #[case(json!(1704412800000_i64), None, "05/01/2024")]
    fn test_date(#[case] input: Value, #[case] format: Option<&str>, #[case] expected: &str) {
        let args: Vec<Value> = format.map(|f| json!(f)).into_iter().collect();
        assert_eq!(DateFilter.apply(&input, &args).unwrap(), json!(expected));
    }

    #[rstest]
    #[case(json!("not a date"))]
    #[case(json!("31/02/2024"))]
    #[case(json!("05/01/20245"))]
    #[case(json!("2024-13-01"))]
    #[case(json!(true))]
    fn test_unparseable_round_trips(#[case] input: Value) {
        let expected = input_text(&input);
        assert_eq!(DateFilter.apply(&input, &[]).unwrap(), json!(expected));
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert_eq!(DateFilter.apply(&Value::Null, &[]).unwrap(), json!(""));
    }

    #[test]
    fn test_format_tokens_scan_left_to_right() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(format_date(date, "dd.MM.yyyy (ddd)"), "09.07.2024 (09d)");
        assert_eq!(format_date(date, "yyyyMMdd"), "20240709");
        assert_eq!(format_date(date, "Le dd"), "Le 09");
    }
}
