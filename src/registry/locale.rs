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


//! Locale conventions for numeric and currency filters

use serde::{Deserialize, Serialize};

/// Where the currency symbol goes relative to the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolPosition {
    /// `$1,234`
    Prefix,
    /// `1 234 €`
    Suffix,
}

/// Currency presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFormat {
    /// Currency symbol
    pub symbol: String,
    /// Symbol placement
    pub position: SymbolPosition,
    /// Text between amount and symbol
    #[serde(default)]
    pub spacing: String,
}

/// Number formatting conventions used by `number`, `numflex` and `currency`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberLocale {
    /// BCP 47 tag, informational
    pub tag: String,
    /// Separator between groups of three integer digits
    pub grouping_separator: String,
    /// Separator before the fraction
    pub decimal_separator: String,
    /// Currency used by the `currency` filter
    pub currency: CurrencyFormat,
}

impl NumberLocale {
    /// United States English, US dollar
    pub fn en_us() -> Self {
        Self {
            tag: "en-US".to_string(),
            grouping_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            currency: CurrencyFormat {
                symbol: "$".to_string(),
                position: SymbolPosition::Prefix,
                spacing: String::new(),
            },
        }
    }

    /// British English, pound sterling
    pub fn en_gb() -> Self {
        Self {
            tag: "en-GB".to_string(),
            currency: CurrencyFormat {
                symbol: "£".to_string(),
                position: SymbolPosition::Prefix,
                spacing: String::new(),
            },
            ..Self::en_us()
        }
    }

    /// French, euro
    pub fn fr_fr() -> Self {
        Self {
            tag: "fr-FR".to_string(),
            grouping_separator: "\u{202F}".to_string(),
            decimal_separator: ",".to_string(),
            currency: CurrencyFormat {
                symbol: "€".to_string(),
                position: SymbolPosition::Suffix,
                spacing: "\u{00A0}".to_string(),
            },
        }
    }

    /// German, euro
    pub fn de_de() -> Self {
        Self {
            tag: "de-DE".to_string(),
            grouping_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
            currency: CurrencyFormat {
                symbol: "€".to_string(),
                position: SymbolPosition::Suffix,
                spacing: "\u{00A0}".to_string(),
            },
        }
    }

    /// Preset for a language tag (`en-US`, `en_GB`, `fr`, ...), if known
    pub fn for_tag(tag: &str) -> Option<Self> {
        let normalized = tag.replace('_', "-").to_ascii_lowercase();
        match normalized.as_str() {
            "en" | "en-us" => Some(Self::en_us()),
            "en-gb" => Some(Self::en_gb()),
            "fr" | "fr-fr" => Some(Self::fr_fr()),
            "de" | "de-de" => Some(Self::de_de()),
            _ => None,
        }
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::en_us()
    }
}
