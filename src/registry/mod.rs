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


//! Filter registry
//!
//! The registry maps filter names to [`TemplateFilter`] implementations. It is
//! an explicit object handed to the merge engine rather than process-wide
//! state: hosts seed one with [`FilterRegistry::with_defaults`], extend it and
//! share it behind an `Arc`. Reads are lock-free per shard, so concurrent
//! merges can resolve filters while sharing one instance.

#![warn(missing_docs)]

mod filter;
pub mod filters;
mod locale;

pub use filter::{FilterError, FilterFn, FilterResult, FnFilter, TemplateFilter};
pub use locale::{CurrencyFormat, NumberLocale, SymbolPosition};

use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Named set of filters available to expressions
pub struct FilterRegistry {
    filters: DashMap<String, Arc<dyn TemplateFilter>>,
}

impl FilterRegistry {
    /// Registry without any filter
    pub fn empty() -> Self {
        Self {
            filters: DashMap::new(),
        }
    }

    /// Registry seeded with the built-in filters, numbers formatted for `locale`
    pub fn with_defaults(locale: NumberLocale) -> Self {
        let registry = Self::empty();
        filters::register_defaults(&registry, locale);
        log::debug!(
            "Filter registry seeded with {} built-in filters",
            registry.len()
        );
        registry
    }

    /// Register a filter under its own name, returning the one it replaces
    pub fn register<F>(&self, filter: F) -> Option<Arc<dyn TemplateFilter>>
    where
        F: TemplateFilter + 'static,
    {
        self.register_arc(Arc::new(filter))
    }

    /// Register a shared filter, returning the one it replaces
    pub fn register_arc(&self, filter: Arc<dyn TemplateFilter>) -> Option<Arc<dyn TemplateFilter>> {
        let name = filter.name().to_string();
        let previous = self.filters.insert(name.clone(), filter);
        if previous.is_some() {
            log::debug!("Filter '{name}' replaced");
        }
        previous
    }

    /// Register a closure as a filter
    pub fn register_fn<F>(&self, name: impl Into<String>, function: F) -> Option<Arc<dyn TemplateFilter>>
    where
        F: Fn(&Value, &[Value]) -> FilterResult<Value> + Send + Sync + 'static,
    {
        self.register(FnFilter::new(name, function))
    }

    /// Remove a filter
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn TemplateFilter>> {
        self.filters.remove(name).map(|(_, filter)| filter)
    }

    /// Look up a filter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn TemplateFilter>> {
        self.filters.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a filter is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Number of registered filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether no filter is registered
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Apply the filter registered under `name`
    pub fn apply(&self, name: &str, input: &Value, args: &[Value]) -> FilterResult<Value> {
        let filter = self.get(name).ok_or_else(|| FilterError::Unknown {
            name: name.to_string(),
        })?;
        filter.apply(input, args)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_defaults(NumberLocale::default())
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}
