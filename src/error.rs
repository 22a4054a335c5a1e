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


//! Merge failures

use crate::diagnostics::{ErrorReport, RenderError, ReportCode};
use crate::document::DocumentPackage;
use thiserror::Error;

/// Result type for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

/// A merge that rendered completely but had failing tags
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMerge {
    /// Rendered document, failing tags empty or replaced by the error marker
    pub document: DocumentPackage,
    /// Every failure, in document order
    pub errors: Vec<RenderError>,
}

/// Merge failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// No template was supplied
    #[error("No template supplied")]
    NoTemplate,

    /// The container or a template part is not well-formed
    #[error("Malformed template{}: {message}", .part.as_ref().map(|p| format!(" part '{p}'")).unwrap_or_default())]
    TemplateMalformed {
        /// Offending part, when known
        part: Option<String>,
        /// What is wrong
        message: String,
    },

    /// Unusable merge options
    #[error("Invalid merge options: {message}")]
    InvalidOptions {
        /// What is wrong
        message: String,
    },

    /// Tags failed; the rendered document is still available
    #[error("{} placeholder(s) failed to render", .0.errors.len())]
    Placeholders(Box<PartialMerge>),
}

impl MergeError {
    /// Malformed template error
    pub fn malformed(part: Option<String>, message: impl Into<String>) -> Self {
        Self::TemplateMalformed {
            part,
            message: message.into(),
        }
    }

    /// Structured report for callers
    pub fn report(&self) -> ErrorReport {
        match self {
            Self::NoTemplate => ErrorReport::new(ReportCode::NoTemplate, self.to_string()),
            Self::TemplateMalformed { .. } => {
                ErrorReport::new(ReportCode::TemplateMalformed, self.to_string())
            }
            Self::InvalidOptions { .. } => {
                ErrorReport::new(ReportCode::InvalidOptions, self.to_string())
            }
            Self::Placeholders(partial) => ErrorReport::from_errors(&partial.errors),
        }
    }

    /// Tag failures, if this is a placeholder error
    pub fn render_errors(&self) -> &[RenderError] {
        match self {
            Self::Placeholders(partial) => &partial.errors,
            _ => &[],
        }
    }

    /// The partially merged document, if rendering got that far
    pub fn partial(&self) -> Option<&PartialMerge> {
        match self {
            Self::Placeholders(partial) => Some(partial),
            _ => None,
        }
    }

    /// Take the partially merged document
    pub fn into_partial(self) -> Option<PartialMerge> {
        match self {
            Self::Placeholders(partial) => Some(*partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use crate::document::PackagePart;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        assert_eq!(MergeError::NoTemplate.to_string(), "No template supplied");
        assert_eq!(
            MergeError::malformed(Some("word/document.xml".into()), "unclosed element").to_string(),
            "Malformed template part 'word/document.xml': unclosed element"
        );
        assert_eq!(
            MergeError::malformed(None, "bad zip").to_string(),
            "Malformed template: bad zip"
        );
    }

    #[test]
    fn test_report_codes() {
        assert_eq!(MergeError::NoTemplate.report().code, ReportCode::NoTemplate);
        let error = MergeError::InvalidOptions {
            message: "x".into(),
        };
        assert_eq!(error.report().code, ReportCode::InvalidOptions);
        assert!(error.report().details.is_empty());
    }

    #[test]
    fn test_placeholders_keep_document() {
        let document =
            DocumentPackage::from_parts(vec![PackagePart::new("content.xml", "<a>done</a>")]);
        let errors = vec![RenderError::new("content.xml", "x.y(", ErrorKind::Syntax, "bad")];
        let error = MergeError::Placeholders(Box::new(PartialMerge {
            document: document.clone(),
            errors,
        }));

        assert_eq!(error.to_string(), "1 placeholder(s) failed to render");
        assert_eq!(error.report().details.len(), 1);
        assert_eq!(error.render_errors().len(), 1);
        assert_eq!(error.into_partial().map(|p| p.document), Some(document));
    }
}
