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


//! Compiled expression caching

use super::compiler::{CompiledExpression, ExpressionCompiler};
use super::error::CompileResult;
use crate::registry::FilterRegistry;
use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compile
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
}

/// Bounded LRU cache of compiled expressions keyed by expression text
///
/// Shared by every merge of an engine. Only successful compilations are kept;
/// a capacity of zero disables caching entirely.
pub struct ExpressionCache {
    entries: Option<Mutex<LruCache<String, CompiledExpression>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExpressionCache {
    /// Cache holding at most `capacity` expressions
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Whether the cache stores entries
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.lock().cap().get())
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached expression for `source`, refreshing its recency
    pub fn get(&self, source: &str) -> Option<CompiledExpression> {
        let found = self
            .entries
            .as_ref()
            .and_then(|entries| entries.lock().get(source).cloned());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a compiled expression under its source text
    pub fn insert(&self, compiled: CompiledExpression) {
        if let Some(entries) = &self.entries {
            entries.lock().put(compiled.source().to_string(), compiled);
        }
    }

    /// Cached expression, or compile and remember it
    pub fn get_or_compile(
        &self,
        source: &str,
        compiler: &ExpressionCompiler<'_>,
    ) -> CompileResult<CompiledExpression> {
        if let Some(compiled) = self.get(source) {
            return Ok(compiled);
        }
        let compiled = compiler.compile_source(source)?;
        self.insert(compiled.clone());
        Ok(compiled)
    }

    /// Drop every entry, e.g. after filters were replaced in the registry
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Compile results for a single merge pass
///
/// Every distinct expression text is compiled at most once per merge, whether
/// or not the shared cache is enabled; failures are remembered too so a broken
/// tag inside a loop is not re-parsed on every row.
pub struct CompileMemo<'a> {
    compiler: ExpressionCompiler<'a>,
    cache: &'a ExpressionCache,
    results: FxHashMap<String, CompileResult<CompiledExpression>>,
}

impl<'a> CompileMemo<'a> {
    /// Memo compiling with `registry` and backed by `cache`
    pub fn new(registry: &'a FilterRegistry, cache: &'a ExpressionCache) -> Self {
        Self {
            compiler: ExpressionCompiler::new(registry),
            cache,
            results: FxHashMap::default(),
        }
    }

    /// Compiled expression (or compile error) for `source`
    pub fn compile(&mut self, source: &str) -> CompileResult<CompiledExpression> {
        if let Some(result) = self.results.get(source) {
            return result.clone();
        }
        let result = self.cache.get_or_compile(source, &self.compiler);
        if let Err(err) = &result {
            log::debug!("Expression '{source}' failed to compile: {err}");
        }
        self.results.insert(source.to_string(), result.clone());
        result
    }

    /// Number of distinct expressions seen in this merge
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no expression was compiled yet
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileError;

    #[test]
    fn test_cache_hits_and_misses() {
        let registry = FilterRegistry::default();
        let compiler = ExpressionCompiler::new(&registry);
        let cache = ExpressionCache::new(10);

        let first = cache.get_or_compile("a.b | upper", &compiler).unwrap();
        let second = cache.get_or_compile("a.b | upper", &compiler).unwrap();
        assert_eq!(first.source(), second.source());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_lru_eviction() {
        let registry = FilterRegistry::default();
        let compiler = ExpressionCompiler::new(&registry);
        let cache = ExpressionCache::new(2);
        for source in ["a", "b", "c"] {
            cache.get_or_compile(source, &compiler).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_disabled_cache_keeps_nothing() {
        let registry = FilterRegistry::default();
        let compiler = ExpressionCompiler::new(&registry);
        let cache = ExpressionCache::disabled();
        cache.get_or_compile("a", &compiler).unwrap();
        assert!(!cache.is_enabled());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let registry = FilterRegistry::default();
        let compiler = ExpressionCompiler::new(&registry);
        let cache = ExpressionCache::new(10);
        assert!(cache.get_or_compile("a |", &compiler).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memo_compiles_each_expression_once() {
        let registry = FilterRegistry::default();
        let cache = ExpressionCache::disabled();
        let mut memo = CompileMemo::new(&registry, &cache);

        for _ in 0..100 {
            memo.compile("row.name").unwrap();
            assert!(matches!(
                memo.compile("row | nope"),
                Err(CompileError::UnknownFilter { .. })
            ));
        }
        assert_eq!(memo.len(), 2);
        // the disabled cache is consulted once per distinct expression
        assert_eq!(cache.stats().misses, 2);
    }
}
