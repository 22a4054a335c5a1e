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


//! Merge engine - the main entry point for rendering templates

use crate::compiler::{
    CacheStats, CompileMemo, CompileResult, CompiledExpression, ExpressionCache,
    ExpressionCompiler,
};
use crate::config::{EngineConfig, MergeOptions};
use crate::diagnostics::RenderError;
use crate::document::{
    DocumentPackage, MarkupDialect, MergeSession, Node, PackagePart, TagKind, parse_part,
};
use crate::error::{MergeError, MergeResult, PartialMerge};
use crate::registry::FilterRegistry;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Part name used by [`MergeEngine::render_markup`]
pub const MARKUP_PART: &str = "document.xml";

/// A tag found by [`MergeEngine::scan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReport {
    /// Template part
    pub part: String,
    /// Tag type
    pub kind: TagKind,
    /// Tag text between the delimiters
    pub expression: String,
    /// Why the tag would fail, if it is known before evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Renders templates against data
///
/// Merges share the filter registry and the expression cache and nothing
/// else, so one engine can serve concurrent merges.
pub struct MergeEngine {
    registry: Arc<FilterRegistry>,
    cache: ExpressionCache,
    config: EngineConfig,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MergeEngine {
    /// Create an engine with the default filters for the configured locale
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(FilterRegistry::with_defaults(config.locale.clone()));
        Self::with_registry(registry, config)
    }

    /// Create an engine over an existing registry
    pub fn with_registry(registry: Arc<FilterRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            cache: ExpressionCache::new(config.expression_cache_size),
            config,
        }
    }

    /// Filter registry; filters registered here are visible to later merges
    pub fn registry(&self) -> &Arc<FilterRegistry> {
        &self.registry
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a single expression
    pub fn compile(&self, source: &str) -> CompileResult<CompiledExpression> {
        self.cache
            .get_or_compile(source, &ExpressionCompiler::new(&self.registry))
    }

    /// Expression cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached expression
    ///
    /// Needed after replacing a filter that cached expressions already resolved.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Merge `data` into every template part of `template`
    ///
    /// Failing tags do not stop the merge: the document is rendered completely
    /// and returned inside [`MergeError::Placeholders`] with every failure.
    pub fn merge(
        &self,
        template: &DocumentPackage,
        data: &Value,
        options: &MergeOptions,
    ) -> MergeResult<DocumentPackage> {
        options.validate()?;
        if template.parts().is_empty() {
            return Err(MergeError::NoTemplate);
        }

        let dialect = self.dialect_for(template, options);
        let kind = template.kind();
        let mut session = MergeSession::new(&self.registry, &self.cache, options);
        let mut parts = Vec::with_capacity(template.parts().len());
        for part in template.parts() {
            if part.name.ends_with('/') || !kind.is_template_part(&part.name) {
                parts.push(part.clone());
                continue;
            }
            let xml = part_text(part)?;
            let rendered = session
                .render_part(&part.name, xml, data, &dialect)
                .map_err(|e| MergeError::malformed(Some(part.name.clone()), e.to_string()))?;
            parts.push(
                PackagePart::new(part.name.as_str(), rendered).with_compression(part.compression),
            );
        }

        finish(session, DocumentPackage::from_parts(parts))
    }

    /// Merge a zip container, returning the merged container
    pub fn merge_bytes(
        &self,
        template: &[u8],
        data: &Value,
        options: &MergeOptions,
    ) -> MergeResult<Vec<u8>> {
        let package = DocumentPackage::read_zip(template)?;
        self.merge(&package, data, options)?.write_zip()
    }

    /// Merge a single markup part
    ///
    /// Uses the word processing vocabulary unless the options name a dialect.
    pub fn render_markup(
        &self,
        xml: &str,
        data: &Value,
        options: &MergeOptions,
    ) -> MergeResult<String> {
        options.validate()?;
        let dialect = options.dialect.clone().unwrap_or_default();
        let mut session = MergeSession::new(&self.registry, &self.cache, options);
        let rendered = session
            .render_part(MARKUP_PART, xml, data, &dialect)
            .map_err(|e| MergeError::malformed(Some(MARKUP_PART.to_string()), e.to_string()))?;
        let errors = session.finish();
        if errors.is_empty() {
            return Ok(rendered);
        }
        let document = DocumentPackage::from_parts(vec![PackagePart::new(MARKUP_PART, rendered)]);
        Err(placeholders(document, errors))
    }

    /// List every tag of the template with the problems known before evaluation
    ///
    /// Nothing is evaluated. A paired section is listed once, by its opening tag.
    pub fn scan(
        &self,
        template: &DocumentPackage,
        options: &MergeOptions,
    ) -> MergeResult<Vec<TagReport>> {
        options.validate()?;
        let dialect = self.dialect_for(template, options);
        let mut memo = CompileMemo::new(&self.registry, &self.cache);
        let mut reports = Vec::new();
        for part in template.template_parts() {
            let xml = part_text(part)?;
            let nodes = parse_part(xml, options, &dialect)
                .map_err(|e| MergeError::malformed(Some(part.name.clone()), e.to_string()))?;
            collect_tags(&part.name, &nodes, &mut memo, &mut reports);
        }
        log::debug!("Scanned {} tags", reports.len());
        Ok(reports)
    }

    fn dialect_for(&self, template: &DocumentPackage, options: &MergeOptions) -> MarkupDialect {
        options
            .dialect
            .clone()
            .unwrap_or_else(|| template.kind().dialect())
    }
}

impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine")
            .field("filters", &self.registry.len())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

fn part_text(part: &PackagePart) -> MergeResult<&str> {
    std::str::from_utf8(&part.data)
        .map_err(|e| MergeError::malformed(Some(part.name.clone()), format!("not UTF-8: {e}")))
}

fn finish(session: MergeSession<'_>, document: DocumentPackage) -> MergeResult<DocumentPackage> {
    let errors = session.finish();
    if errors.is_empty() {
        return Ok(document);
    }
    Err(placeholders(document, errors))
}

fn placeholders(document: DocumentPackage, errors: Vec<RenderError>) -> MergeError {
    log::warn!("Merge finished with {} failed tags", errors.len());
    MergeError::Placeholders(Box::new(PartialMerge { document, errors }))
}

fn collect_tags(part: &str, nodes: &[Node], memo: &mut CompileMemo<'_>, out: &mut Vec<TagReport>) {
    for node in nodes {
        let (tag, problem) = match node {
            Node::Markup(_) | Node::Text(_) => continue,
            Node::Substitution(tag) => (tag, memo.compile(&tag.expression).err().map(|e| e.to_string())),
            Node::Section { tag, .. } => (tag, memo.compile(&tag.expression).err().map(|e| e.to_string())),
            Node::Invalid { tag, cause } => (tag, Some(cause.clone())),
        };
        out.push(TagReport {
            part: part.to_string(),
            kind: tag.kind,
            expression: tag.raw.clone(),
            problem,
        });
        if let Node::Section { children, .. } = node {
            collect_tags(part, children, memo, out);
        }
    }
}
