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


//! Engine and merge configuration

use crate::document::MarkupDialect;
use crate::error::{MergeError, MergeResult};
use crate::registry::NumberLocale;
use serde::{Deserialize, Serialize};

/// Tag delimiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Opening delimiter
    pub start: String,
    /// Closing delimiter
    pub end: String,
}

impl Delimiters {
    /// Custom delimiters, e.g. `[[` / `]]`
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{", "}")
    }
}

/// Per-merge options
///
/// Deserializes from the request options object, e.g.
/// `{ "paragraphLoop": true, "linebreaks": true }`; missing keys take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
    /// Sections whose markers sit alone in their paragraphs repeat whole paragraphs
    pub paragraph_loop: bool,
    /// Newlines in rendered values become line breaks
    pub linebreaks: bool,
    /// Tag delimiters
    pub delimiters: Delimiters,
    /// Text rendered in place of a failing tag; failing tags render empty when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_marker: Option<String>,
    /// Markup vocabulary override; detected from the container when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<MarkupDialect>,
}

impl MergeOptions {
    /// Options with paragraph loops and line breaks enabled
    pub fn paragraphs() -> Self {
        Self {
            paragraph_loop: true,
            linebreaks: true,
            ..Self::default()
        }
    }

    /// Parse options from JSON
    pub fn from_json(json: &str) -> MergeResult<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| MergeError::InvalidOptions {
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options are usable
    pub fn validate(&self) -> MergeResult<()> {
        if self.delimiters.start.is_empty() || self.delimiters.end.is_empty() {
            return Err(MergeError::InvalidOptions {
                message: "delimiters must not be empty".to_string(),
            });
        }
        if let Some(dialect) = &self.dialect {
            if dialect.line_break.is_empty() && self.linebreaks {
                return Err(MergeError::InvalidOptions {
                    message: "linebreaks needs a dialect with line-break markup".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Compiled expressions kept across merges; 0 disables the cache
    pub expression_cache_size: usize,
    /// Number formatting used by the default filters
    pub locale: NumberLocale,
}

impl EngineConfig {
    /// Create a configuration
    pub fn new(expression_cache_size: usize, locale: NumberLocale) -> Self {
        Self {
            expression_cache_size,
            locale,
        }
    }

    /// Configuration without an expression cache
    pub fn no_cache() -> Self {
        Self {
            expression_cache_size: 0,
            ..Self::default()
        }
    }

    /// Configuration for a locale, with the default cache
    pub fn with_locale(locale: NumberLocale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(1_000, NumberLocale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_from_json() {
        let options = MergeOptions::from_json(r#"{"paragraphLoop": true, "linebreaks": true}"#)
            .unwrap();
        assert_eq!(options, MergeOptions::paragraphs());

        let options =
            MergeOptions::from_json(r#"{"delimiters": {"start": "[[", "end": "]]"}, "errorMarker": "?"}"#)
                .unwrap();
        assert_eq!(options.delimiters, Delimiters::new("[[", "]]"));
        assert_eq!(options.error_marker.as_deref(), Some("?"));
        assert!(!options.paragraph_loop);
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            MergeOptions::from_json(r#"{"paragraphLoop": "yes"}"#),
            Err(MergeError::InvalidOptions { .. })
        ));
        assert!(matches!(
            MergeOptions::from_json(r#"{"delimiters": {"start": "", "end": "}"}}"#),
            Err(MergeError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.expression_cache_size, 1_000);
        assert_eq!(config.locale, NumberLocale::en_us());
        assert_eq!(EngineConfig::no_cache().expression_cache_size, 0);
        assert_eq!(
            EngineConfig::with_locale(NumberLocale::de_de()).locale.tag,
            "de-DE"
        );
    }
}
