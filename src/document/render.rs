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


//! Rendering of template trees

use super::dialect::MarkupDialect;
use super::markup::{MarkupError, lex};
use super::section::{Node, build_tree};
use super::tags::{Tag, scan};
use crate::compiler::{CompileMemo, ExpressionCache};
use crate::config::MergeOptions;
use crate::diagnostics::{ErrorAggregator, ErrorKind, RenderError};
use crate::evaluator::Scope;
use crate::model::ValueExt;
use crate::registry::FilterRegistry;
use quick_xml::escape::partial_escape;
use serde_json::Value;

/// Lex, scan and pair one part into its render tree
pub fn parse_part(
    xml: &str,
    options: &MergeOptions,
    dialect: &MarkupDialect,
) -> Result<Vec<Node>, MarkupError> {
    let chunks = lex(xml, dialect)?;
    let items = scan(chunks, &options.delimiters, dialect);
    Ok(build_tree(&items, options.paragraph_loop, dialect))
}

/// State of one merge pass: compiled expressions and recorded failures
///
/// A session is created per merge and shared by all parts of the document, so
/// an expression used in the body and in a footer is compiled once.
pub struct MergeSession<'a> {
    memo: CompileMemo<'a>,
    errors: ErrorAggregator,
    options: &'a MergeOptions,
}

impl<'a> MergeSession<'a> {
    /// Start a merge pass
    pub fn new(
        registry: &'a FilterRegistry,
        cache: &'a ExpressionCache,
        options: &'a MergeOptions,
    ) -> Self {
        Self {
            memo: CompileMemo::new(registry, cache),
            errors: ErrorAggregator::new(),
            options,
        }
    }

    /// Render one part against `data`
    ///
    /// Tag failures are recorded and the part still renders; only malformed
    /// markup is an error.
    pub fn render_part(
        &mut self,
        part: &str,
        xml: &str,
        data: &Value,
        dialect: &MarkupDialect,
    ) -> Result<String, MarkupError> {
        let nodes = parse_part(xml, self.options, dialect)?;
        let scope = Scope::root(data);
        let mut out = String::with_capacity(xml.len() + xml.len() / 4);
        let before = self.errors.len();
        self.render_nodes(part, dialect, &nodes, &scope, &mut out);
        log::debug!(
            "Rendered part '{part}': {} bytes, {} failed tags",
            out.len(),
            self.errors.len() - before
        );
        Ok(out)
    }

    /// Failures recorded so far
    pub fn errors(&self) -> &ErrorAggregator {
        &self.errors
    }

    /// Finish the pass, returning every failure in document order
    pub fn finish(mut self) -> Vec<RenderError> {
        log::trace!("Merge compiled {} distinct expressions", self.memo.len());
        self.errors.drain()
    }

    fn render_nodes(
        &mut self,
        part: &str,
        dialect: &MarkupDialect,
        nodes: &[Node],
        scope: &Scope<'_>,
        out: &mut String,
    ) {
        for node in nodes {
            match node {
                Node::Markup(raw) => out.push_str(raw),
                Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Node::Substitution(tag) => match self.evaluate(part, tag, scope) {
                    Some(value) => push_value(out, &value.to_display_string(), self.options, dialect),
                    None => self.push_failure(out),
                },
                Node::Section {
                    tag,
                    inverted,
                    children,
                } => {
                    let Some(value) = self.evaluate(part, tag, scope) else {
                        self.push_failure(out);
                        continue;
                    };
                    if *inverted {
                        if value.is_empty_section() {
                            self.render_nodes(part, dialect, children, scope, out);
                        }
                    } else if let Value::Array(elements) = &value {
                        log::trace!("Section '{}' repeats {} times", tag.expression, elements.len());
                        let total = elements.len();
                        for (index, element) in elements.iter().enumerate() {
                            let child = Scope::child(scope, element, index, total);
                            self.render_nodes(part, dialect, children, &child, out);
                        }
                    }
                }
                Node::Invalid { tag, cause } => {
                    self.errors.record(RenderError::new(
                        part,
                        tag.raw.as_str(),
                        ErrorKind::Structure,
                        cause.as_str(),
                    ));
                    self.push_failure(out);
                }
            }
        }
    }

    fn evaluate(&mut self, part: &str, tag: &Tag, scope: &Scope<'_>) -> Option<Value> {
        let compiled = match self.memo.compile(&tag.expression) {
            Ok(compiled) => compiled,
            Err(err) => {
                self.errors.record(RenderError::new(
                    part,
                    tag.raw.as_str(),
                    ErrorKind::Syntax,
                    err.to_string(),
                ));
                return None;
            }
        };
        match compiled.evaluate(scope) {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.record(RenderError::new(
                    part,
                    tag.raw.as_str(),
                    ErrorKind::Evaluation,
                    err.to_string(),
                ));
                None
            }
        }
    }

    fn push_failure(&self, out: &mut String) {
        if let Some(marker) = &self.options.error_marker {
            out.push_str(&partial_escape(marker.as_str()));
        }
    }
}

fn push_value(out: &mut String, text: &str, options: &MergeOptions, dialect: &MarkupDialect) {
    if !options.linebreaks || !text.contains('\n') {
        out.push_str(&partial_escape(text));
        return;
    }
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push_str(&dialect.line_break);
        }
        out.push_str(&partial_escape(line.trim_end_matches('\r')));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(xml: &str, data: &Value, options: &MergeOptions) -> (String, Vec<RenderError>) {
        let registry = FilterRegistry::default();
        let cache = ExpressionCache::default();
        let mut session = MergeSession::new(&registry, &cache, options);
        let out = session
            .render_part("test.xml", xml, data, &MarkupDialect::wordprocessing())
            .unwrap();
        (out, session.finish())
    }

    #[test]
    fn test_substitution_is_escaped() {
        let (out, errors) = render(
            "<w:t>Hi {name}</w:t>",
            &json!({"name": "<Tom & Jerry>"}),
            &MergeOptions::default(),
        );
        assert_eq!(out, "<w:t xml:space=\"preserve\">Hi &lt;Tom &amp; Jerry&gt;</w:t>");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_loop_with_parent_scope() {
        let (out, _) = render(
            "<w:t>{#items}{name}@{shop}#{$index};{/items}</w:t>",
            &json!({"shop": "S", "items": [{"name": "a"}, {"name": "b"}]}),
            &MergeOptions::default(),
        );
        assert_eq!(out, "<w:t xml:space=\"preserve\">a@S#0;b@S#1;</w:t>");
    }

    #[test]
    fn test_empty_and_non_sequence_sections_vanish() {
        let data = json!({"none": [], "obj": {"a": 1}, "flag": true});
        let (out, errors) = render(
            "<w:t>[{#none}x{/none}{#obj}y{/obj}{#flag}z{/flag}{#missing}w{/missing}]</w:t>",
            &data,
            &MergeOptions::default(),
        );
        assert_eq!(out, "<w:t xml:space=\"preserve\">[]</w:t>");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_inverted_section() {
        let data = json!({"none": [], "some": [1], "off": false});
        let (out, _) = render(
            "<w:t>{^none}A{/}{^some}B{/}{^off}C{/}{^missing}D{/}</w:t>",
            &data,
            &MergeOptions::default(),
        );
        assert_eq!(out, "<w:t xml:space=\"preserve\">ACD</w:t>");
    }

    #[test]
    fn test_failures_are_recorded_in_order() {
        let options = MergeOptions {
            error_marker: Some("#ERR".to_string()),
            ..MergeOptions::default()
        };
        let (out, errors) = render("<w:t>{a / 0} {ok} {b |}</w:t>", &json!({"a": 1, "ok": "fine"}), &options);
        assert_eq!(out, "<w:t xml:space=\"preserve\">#ERR fine #ERR</w:t>");
        let summary: Vec<_> = errors.iter().map(|e| (e.expression.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![("a / 0", ErrorKind::Evaluation), ("b |", ErrorKind::Syntax)]
        );
    }

    #[test]
    fn test_loop_failures_are_not_deduplicated() {
        let (_, errors) = render(
            "<w:t>{#rows}{n / 0}{/rows}</w:t>",
            &json!({"rows": [{"n": 1}, {"n": 2}]}),
            &MergeOptions::default(),
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_linebreaks() {
        let data = json!({"address": "1 Main St\r\nSpringfield"});
        let (plain, _) = render("<w:t>{address}</w:t>", &data, &MergeOptions::default());
        assert_eq!(plain, "<w:t xml:space=\"preserve\">1 Main St\r\nSpringfield</w:t>");

        let options = MergeOptions {
            linebreaks: true,
            ..MergeOptions::default()
        };
        let (broken, _) = render("<w:t>{address}</w:t>", &data, &options);
        assert_eq!(
            broken,
            "<w:t xml:space=\"preserve\">1 Main St</w:t><w:br/><w:t xml:space=\"preserve\">Springfield</w:t>"
        );
    }
}
