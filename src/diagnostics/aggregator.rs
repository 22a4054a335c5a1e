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


//! Per-merge error aggregation

use serde::Serialize;
use std::fmt;

/// What went wrong with a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The expression does not compile
    Syntax,
    /// The expression compiled but failed at evaluation time
    Evaluation,
    /// The tag is misplaced: unclosed delimiter, unmatched section marker
    Structure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::Evaluation => "evaluation",
            Self::Structure => "structure",
        })
    }
}

/// One failed tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderError {
    /// Template part the tag belongs to
    pub part: String,
    /// Tag text between the delimiters, prefix included
    pub expression: String,
    /// Failure category
    pub kind: ErrorKind,
    /// Human readable cause
    pub cause: String,
}

impl RenderError {
    /// Create a render error
    pub fn new(
        part: impl Into<String>,
        expression: impl Into<String>,
        kind: ErrorKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            part: part.into(),
            expression: expression.into(),
            kind,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} error in '{}': {}",
            self.part, self.kind, self.expression, self.cause
        )
    }
}

/// Collects tag failures in document order
///
/// No deduplication: the same expression failing at two positions, or in two
/// iterations of a loop, is recorded twice.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    errors: Vec<RenderError>,
}

impl ErrorAggregator {
    /// Empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn record(&mut self, error: RenderError) {
        log::debug!("Recorded {error}");
        self.errors.push(error);
    }

    /// Whether any failure was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of failures recorded
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failures recorded so far
    pub fn errors(&self) -> &[RenderError] {
        &self.errors
    }

    /// Take every failure, leaving the aggregator empty
    pub fn drain(&mut self) -> Vec<RenderError> {
        std::mem::take(&mut self.errors)
    }
}
