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


//! Section pairing
//!
//! Section markers are matched with a stack and the flat item list becomes a
//! tree. Markers that cannot be paired turn into [`Node::Invalid`] and render as
//! failures; the content around them is rendered normally.

use super::dialect::MarkupDialect;
use super::markup::ElementEvent;
use super::tags::{Item, Tag, TagKind};
use std::ops::Range;

/// Renderable template tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Markup copied through verbatim
    Markup(String),
    /// Literal text, escaped on output
    Text(String),
    /// `{expr}`
    Substitution(Tag),
    /// `{#expr}...{/}` or `{^expr}...{/}`
    Section {
        /// Opening tag
        tag: Tag,
        /// Whether this is an inverted section
        inverted: bool,
        /// Section body
        children: Vec<Node>,
    },
    /// A tag in a position where it makes no sense
    Invalid {
        /// The offending tag
        tag: Tag,
        /// Why it is invalid
        cause: String,
    },
}

#[derive(Debug, Clone, Copy)]
struct Paragraph {
    start: usize,
    end: usize,
    tags: usize,
    last_tag: Option<usize>,
    has_text: bool,
}

impl Paragraph {
    fn sole_tag(&self) -> Option<usize> {
        if self.tags == 1 && !self.has_text {
            self.last_tag
        } else {
            None
        }
    }
}

struct Paragraphs {
    spans: Vec<Paragraph>,
    innermost: Vec<Option<usize>>,
}

impl Paragraphs {
    fn collect(items: &[Item], dialect: &MarkupDialect) -> Self {
        let mut spans: Vec<Paragraph> = Vec::new();
        let mut innermost = Vec::with_capacity(items.len());
        let mut open: Vec<usize> = Vec::new();

        for (index, item) in items.iter().enumerate() {
            match item {
                Item::Markup {
                    element: Some(mark),
                    ..
                } if dialect.is_paragraph(&mark.name) => match mark.event {
                    ElementEvent::Open => {
                        open.push(spans.len());
                        spans.push(Paragraph {
                            start: index,
                            end: index,
                            tags: 0,
                            last_tag: None,
                            has_text: false,
                        });
                    }
                    ElementEvent::Close => {
                        if let Some(id) = open.pop() {
                            spans[id].end = index;
                            innermost.push(Some(id));
                            continue;
                        }
                    }
                    ElementEvent::Empty => {}
                },
                Item::Tag(_) => {
                    if let Some(&id) = open.last() {
                        spans[id].tags += 1;
                        spans[id].last_tag = Some(index);
                    }
                }
                Item::Text(text) if !text.trim().is_empty() => {
                    if let Some(&id) = open.last() {
                        spans[id].has_text = true;
                    }
                }
                _ => {}
            }
            innermost.push(open.last().copied());
        }
        Self { spans, innermost }
    }

    fn sole_paragraph(&self, tag_index: usize) -> Option<Paragraph> {
        let paragraph = self.spans[self.innermost[tag_index]?];
        (paragraph.sole_tag() == Some(tag_index)).then_some(paragraph)
    }
}

#[derive(Debug, Clone)]
struct SectionSpan {
    open: usize,
    close: usize,
    outer: Range<usize>,
    body: Range<usize>,
    mismatch: Option<String>,
}

fn tag_at(items: &[Item], index: usize) -> Option<&Tag> {
    match items.get(index) {
        Some(Item::Tag(tag)) => Some(tag),
        _ => None,
    }
}

/// Pair section markers and build the render tree
pub fn build_tree(items: &[Item], paragraph_loop: bool, dialect: &MarkupDialect) -> Vec<Node> {
    let mut faults: Vec<Option<&'static str>> = vec![None; items.len()];
    let mut sections = Vec::new();
    let mut open_stack: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Item::Tag(tag) = item else { continue };
        match tag.kind {
            kind if kind.opens_section() => open_stack.push(index),
            TagKind::Close => match open_stack.pop() {
                Some(open) => {
                    let opened = tag_at(items, open).map_or("", |t| t.expression.as_str());
                    let mismatch = (!tag.expression.is_empty() && tag.expression != opened)
                        .then(|| format!("section '{opened}' is closed by '{}'", tag.expression));
                    sections.push(SectionSpan {
                        open,
                        close: index,
                        outer: open..index + 1,
                        body: open + 1..index,
                        mismatch,
                    });
                }
                None => faults[index] = Some("closing tag without an open section"),
            },
            _ => {}
        }
    }
    for open in open_stack {
        faults[open] = Some("section is never closed");
    }

    if paragraph_loop {
        let paragraphs = Paragraphs::collect(items, dialect);
        for section in &mut sections {
            expand_to_paragraphs(items, &paragraphs, section);
        }
    }

    let mut starts: Vec<Option<usize>> = vec![None; items.len()];
    for (id, section) in sections.iter().enumerate() {
        starts[section.outer.start] = Some(id);
    }

    let builder = TreeBuilder {
        items,
        sections: &sections,
        starts: &starts,
        faults: &faults,
    };
    builder.build(0..items.len())
}

/// Replicate whole paragraphs when both markers sit alone in their own paragraph
fn expand_to_paragraphs(items: &[Item], paragraphs: &Paragraphs, section: &mut SectionSpan) {
    let (Some(first), Some(last)) = (
        paragraphs.sole_paragraph(section.open),
        paragraphs.sole_paragraph(section.close),
    ) else {
        return;
    };
    if first.end >= last.start {
        return;
    }
    // removed paragraphs may not hide any other tag (e.g. in a nested text box)
    let removed = (first.start..=first.end).chain(last.start..=last.end);
    let hides_tags = removed
        .filter(|&i| i != section.open && i != section.close)
        .any(|i| matches!(items[i], Item::Tag(_)));
    if hides_tags {
        return;
    }
    section.outer = first.start..last.end + 1;
    section.body = first.end + 1..last.start;
}

struct TreeBuilder<'a> {
    items: &'a [Item],
    sections: &'a [SectionSpan],
    starts: &'a [Option<usize>],
    faults: &'a [Option<&'static str>],
}

impl TreeBuilder<'_> {
    fn build(&self, range: Range<usize>) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut index = range.start;
        while index < range.end {
            if let Some(id) = self.starts[index] {
                let section = &self.sections[id];
                if let Some(tag) = tag_at(self.items, section.open) {
                    nodes.push(Node::Section {
                        tag: tag.clone(),
                        inverted: tag.kind == TagKind::InvertedSection,
                        children: self.build(section.body.clone()),
                    });
                }
                if let (Some(cause), Some(tag)) =
                    (&section.mismatch, tag_at(self.items, section.close))
                {
                    nodes.push(Node::Invalid {
                        tag: tag.clone(),
                        cause: cause.clone(),
                    });
                }
                index = section.outer.end;
                continue;
            }
            nodes.push(self.node(index));
            index += 1;
        }
        nodes
    }

    fn node(&self, index: usize) -> Node {
        match &self.items[index] {
            Item::Markup { raw, .. } => Node::Markup(raw.clone()),
            Item::Text(text) => Node::Text(text.clone()),
            Item::Tag(tag) => match (tag.kind, self.faults[index]) {
                (TagKind::Substitution, _) => Node::Substitution(tag.clone()),
                (TagKind::Unclosed, _) => Node::Invalid {
                    tag: tag.clone(),
                    cause: "tag is missing its end delimiter".to_string(),
                },
                (_, cause) => Node::Invalid {
                    tag: tag.clone(),
                    cause: cause.unwrap_or("misplaced section tag").to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Delimiters;
    use crate::document::markup::lex;
    use crate::document::tags::scan;

    fn tree(xml: &str, paragraph_loop: bool) -> Vec<Node> {
        let dialect = MarkupDialect::wordprocessing();
        let items = scan(lex(xml, &dialect).unwrap(), &Delimiters::default(), &dialect);
        build_tree(&items, paragraph_loop, &dialect)
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    fn sections(nodes: &[Node]) -> Vec<&Node> {
        nodes
            .iter()
            .filter(|node| matches!(node, Node::Section { .. }))
            .collect()
    }

    fn invalid_causes(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Invalid { cause, .. } => Some(cause.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_inline_section() {
        let nodes = tree(&para("{#items}{name}, {/items}done"), false);
        let found = sections(&nodes);
        assert_eq!(found.len(), 1);
        let Node::Section { tag, inverted, children } = found[0] else {
            unreachable!()
        };
        assert_eq!(tag.expression, "items");
        assert!(!inverted);
        assert!(matches!(&children[0], Node::Substitution(t) if t.expression == "name"));
        assert_eq!(children[1], Node::Text(", ".to_string()));
        assert!(nodes.contains(&Node::Text("done".to_string())));
    }

    #[test]
    fn test_nested_and_anonymous_close() {
        let nodes = tree(&para("{#a}{^b}x{/}{/a}"), false);
        let Node::Section { children, .. } = sections(&nodes)[0] else {
            unreachable!()
        };
        let inner = sections(children);
        assert_eq!(inner.len(), 1);
        assert!(matches!(inner[0], Node::Section { inverted: true, .. }));
    }

    #[test]
    fn test_structural_faults() {
        let nodes = tree(&para("{/x}{#open}text"), false);
        assert_eq!(
            invalid_causes(&nodes),
            vec![
                "closing tag without an open section".to_string(),
                "section is never closed".to_string()
            ]
        );
        assert!(nodes.contains(&Node::Text("text".to_string())));

        let nodes = tree(&para("{#a}x{/b}"), false);
        assert_eq!(sections(&nodes).len(), 1);
        assert_eq!(
            invalid_causes(&nodes),
            vec!["section 'a' is closed by 'b'".to_string()]
        );
    }

    #[test]
    fn test_paragraph_loop_removes_marker_paragraphs() {
        let xml = format!(
            "<w:body>{}{}{}</w:body>",
            para("{#rows}"),
            para("{name}"),
            para("{/rows}")
        );
        let nodes = tree(&xml, true);
        // body markup, section, closing body markup
        assert_eq!(nodes.len(), 3);
        let Node::Section { children, .. } = &nodes[1] else {
            unreachable!()
        };
        assert!(matches!(children.first(), Some(Node::Markup(raw)) if raw == "<w:p>"));
        assert!(matches!(children.last(), Some(Node::Markup(raw)) if raw == "</w:p>"));
    }

    #[test]
    fn test_paragraph_loop_needs_lone_markers() {
        let xml = format!(
            "<w:body>{}{}{}</w:body>",
            para("Rows: {#rows}"),
            para("{name}"),
            para("{/rows}")
        );
        let nodes = tree(&xml, true);
        let Node::Section { children, .. } = sections(&nodes)[0] else {
            unreachable!()
        };
        // the body starts right after the marker, inside its paragraph
        assert!(matches!(children.first(), Some(Node::Markup(raw)) if raw == "</w:t>"));
    }
}
