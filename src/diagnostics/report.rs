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


//! Structured failure report

use super::aggregator::RenderError;
use serde::Serialize;
use std::fmt;

/// Failure category of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportCode {
    /// No template was supplied
    NoTemplate,
    /// The template container or one of its parts cannot be parsed
    TemplateMalformed,
    /// The merge options are unusable
    InvalidOptions,
    /// One or more placeholders failed
    Placeholders,
}

/// One failed placeholder in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Tag text
    pub expression: String,
    /// Why it failed
    pub cause: String,
    /// Template part, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
}

impl From<&RenderError> for ErrorDetail {
    fn from(error: &RenderError) -> Self {
        Self {
            expression: error.expression.clone(),
            cause: format!("{} error: {}", error.kind, error.cause),
            part: Some(error.part.clone()),
        }
    }
}

/// `{ message, details }` summary handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Failure category
    pub code: ReportCode,
    /// Human readable summary
    pub message: String,
    /// Failed placeholders, in document order
    pub details: Vec<ErrorDetail>,
}

impl ErrorReport {
    /// Report without details
    pub fn new(code: ReportCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Report for a set of failed placeholders
    pub fn from_errors(errors: &[RenderError]) -> Self {
        let message = match errors.len() {
            1 => "1 placeholder failed to render".to_string(),
            n => format!("{n} placeholders failed to render"),
        };
        Self {
            code: ReportCode::Placeholders,
            message,
            details: errors.iter().map(ErrorDetail::from).collect(),
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        for detail in &self.details {
            match &detail.part {
                Some(part) => writeln!(f, "  {part}: {{{}}}: {}", detail.expression, detail.cause)?,
                None => writeln!(f, "  {{{}}}: {}", detail.expression, detail.cause)?,
            }
        }
        Ok(())
    }
}
