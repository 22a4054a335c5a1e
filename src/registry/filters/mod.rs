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


//! Built-in filters

mod date;
mod json;
pub mod number;
pub mod string;

pub use date::{DEFAULT_DATE_FORMAT, DateFilter, format_date, parse_date};
pub use json::JsonFilter;
pub use number::{CurrencyFilter, NumberFilter, NumflexFilter};
pub use string::{CapitalizeFilter, LimitToFilter, LowerFilter, UpperFilter};

use super::{FilterRegistry, NumberLocale};
use crate::model::ValueExt;
use serde_json::Value;

/// Register every built-in filter
pub fn register_defaults(registry: &FilterRegistry, locale: NumberLocale) {
    registry.register(UpperFilter);
    registry.register(LowerFilter);
    registry.register(CapitalizeFilter);
    registry.register(LimitToFilter);
    registry.register(NumberFilter::new(locale.clone()));
    registry.register(NumflexFilter::new(locale.clone()));
    registry.register(CurrencyFilter::new(locale));
    registry.register(DateFilter);
    registry.register(JsonFilter);
}

/// String form of a filter input; `null` and `{}` are empty
pub(crate) fn input_text(input: &Value) -> String {
    if input.is_blank() {
        String::new()
    } else {
        input.to_display_string()
    }
}

/// Argument at `index`, treating `null` as missing
pub(crate) fn argument(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|value| !value.is_null())
}
