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


//! Filter trait and error types

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors a filter can raise when it cannot degrade gracefully
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// An argument has a value the filter cannot work with
    #[error("Filter '{filter}' argument {index}: {message}")]
    InvalidArgument {
        /// Filter name
        filter: Cow<'static, str>,
        /// 0-based argument position (the piped value is not counted)
        index: usize,
        /// What is wrong with the argument
        message: Cow<'static, str>,
    },

    /// The filter failed for another reason
    #[error("Filter '{filter}' failed: {message}")]
    Failed {
        /// Filter name
        filter: Cow<'static, str>,
        /// Error message
        message: Cow<'static, str>,
    },

    /// No filter is registered under this name
    #[error("Unknown filter '{name}'")]
    Unknown {
        /// Requested name
        name: String,
    },
}

impl FilterError {
    /// Create an invalid argument error
    pub fn invalid_argument(
        filter: impl Into<Cow<'static, str>>,
        index: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            filter: filter.into(),
            index,
            message: message.into(),
        }
    }

    /// Create a generic failure
    pub fn failed(
        filter: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Failed {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// A named formatting function applied with `value | name:arg1:arg2`
///
/// Filters are pure: the same input and arguments always give the same
/// output. They are shared between threads once registered.
pub trait TemplateFilter: Send + Sync {
    /// Name used in expressions
    fn name(&self) -> &str;

    /// One-line description shown by tooling
    fn documentation(&self) -> &str {
        ""
    }

    /// Transform `input`; `args` are the evaluated colon-separated arguments
    fn apply(&self, input: &Value, args: &[Value]) -> FilterResult<Value>;
}

/// Signature of closures registered with [`FilterRegistry::register_fn`](super::FilterRegistry::register_fn)
pub type FilterFn = dyn Fn(&Value, &[Value]) -> FilterResult<Value> + Send + Sync;

/// Adapter turning a closure into a [`TemplateFilter`]
pub struct FnFilter {
    name: String,
    documentation: String,
    function: Box<FilterFn>,
}

impl FnFilter {
    /// Wrap a closure under `name`
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FilterResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            documentation: String::new(),
            function: Box::new(function),
        }
    }

    /// Attach a description
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").field("name", &self.name).finish()
    }
}

impl TemplateFilter for FnFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn apply(&self, input: &Value, args: &[Value]) -> FilterResult<Value> {
        (self.function)(input, args)
    }
}
