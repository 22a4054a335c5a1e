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


//! Placeholder tag scanning
//!
//! Text elements are scanned as one continuous string, so a placeholder whose
//! characters were split over several runs by the word processor is still
//! found. A tag is emitted in the run where its start delimiter sits; the
//! characters it consumes from following runs disappear from those runs.

use super::dialect::MarkupDialect;
use super::markup::{Chunk, ElementMark};
use crate::config::Delimiters;
use serde::Serialize;

/// Longest excerpt kept for an unclosed tag
const UNCLOSED_EXCERPT: usize = 40;

/// Tag type, from the prefix after the start delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TagKind {
    /// `{expr}`
    Substitution,
    /// `{#expr}`
    Section,
    /// `{^expr}`
    InvertedSection,
    /// `{/expr}` or `{/}`
    Close,
    /// A start delimiter without a matching end delimiter
    Unclosed,
}

impl TagKind {
    /// Short lowercase label
    pub fn label(self) -> &'static str {
        match self {
            Self::Substitution => "substitution",
            Self::Section => "section",
            Self::InvertedSection => "inverted",
            Self::Close => "close",
            Self::Unclosed => "unclosed",
        }
    }

    /// Whether the tag opens a section
    pub fn opens_section(self) -> bool {
        matches!(self, Self::Section | Self::InvertedSection)
    }
}

/// A placeholder found in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Text between the delimiters as written
    pub raw: String,
    /// Tag type
    pub kind: TagKind,
    /// Expression without prefix and surrounding whitespace
    pub expression: String,
}

impl Tag {
    /// Classify the text found between delimiters
    pub fn parse(inner: &str) -> Self {
        let trimmed = inner.trim();
        let (kind, rest) = match trimmed.chars().next() {
            Some('#') => (TagKind::Section, &trimmed[1..]),
            Some('^') => (TagKind::InvertedSection, &trimmed[1..]),
            Some('/') => (TagKind::Close, &trimmed[1..]),
            _ => (TagKind::Substitution, trimmed),
        };
        Self {
            raw: inner.to_string(),
            kind,
            expression: rest.trim().to_string(),
        }
    }

    fn unclosed(excerpt: &str) -> Self {
        let raw: String = excerpt.chars().take(UNCLOSED_EXCERPT).collect();
        Self {
            raw: raw.trim().to_string(),
            kind: TagKind::Unclosed,
            expression: String::new(),
        }
    }
}

/// Scanned part content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Markup copied through verbatim
    Markup {
        /// Text as written
        raw: String,
        /// Set for element tags
        element: Option<ElementMark>,
    },
    /// Literal run text, unescaped
    Text(String),
    /// A placeholder
    Tag(Tag),
}

struct TagSpan {
    start: usize,
    end: usize,
    tag: Tag,
}

/// Locate every tag in `text`
///
/// The next start and end delimiter positions are carried forward between
/// tags, so each byte is searched once.
fn find_tags(text: &str, delimiters: &Delimiters) -> Vec<TagSpan> {
    let open = delimiters.start.as_str();
    let close = delimiters.end.as_str();
    let find_from = |needle: &str, from: usize| text[from..].find(needle).map(|i| from + i);

    let mut spans = Vec::new();
    let mut next_open = find_from(open, 0);
    // `None` once no end delimiter remains
    let mut next_close = Some(0);

    while let Some(start) = next_open {
        let inner_start = start + open.len();
        let following_open = find_from(open, inner_start);
        if next_close.is_some_and(|end| end < inner_start) {
            next_close = find_from(close, inner_start);
        }
        let closed = next_close.filter(|&end| {
            following_open.map_or(true, |next| next + open.len() > end)
        });
        match closed {
            Some(end) => {
                spans.push(TagSpan {
                    start,
                    end: end + close.len(),
                    tag: Tag::parse(&text[inner_start..end]),
                });
                let resume = end + close.len();
                next_open = match following_open {
                    Some(next) if next >= resume => Some(next),
                    Some(_) => find_from(open, resume),
                    None => None,
                };
            }
            None => {
                let excerpt_end = following_open.unwrap_or(text.len());
                spans.push(TagSpan {
                    start,
                    end: inner_start,
                    tag: Tag::unclosed(&text[inner_start..excerpt_end]),
                });
                next_open = following_open;
            }
        }
    }
    spans
}

/// Turn lexed chunks into markup, literal text and tags
pub fn scan(chunks: Vec<Chunk>, delimiters: &Delimiters, dialect: &MarkupDialect) -> Vec<Item> {
    let full: String = chunks
        .iter()
        .filter_map(|chunk| match chunk {
            Chunk::Text(run) => Some(run.content.as_str()),
            Chunk::Markup { .. } => None,
        })
        .collect();
    let spans = find_tags(&full, delimiters);

    let mut items = Vec::with_capacity(chunks.len() + spans.len() * 2);
    let mut offset = 0;
    let mut first_span = 0;

    for chunk in chunks {
        let run = match chunk {
            Chunk::Markup { raw, element } => {
                items.push(Item::Markup { raw, element });
                continue;
            }
            Chunk::Text(run) => run,
        };
        let (start, end) = (offset, offset + run.content.len());
        offset = end;

        while first_span < spans.len() && spans[first_span].end <= start {
            first_span += 1;
        }
        let touched = spans
            .get(first_span)
            .is_some_and(|span| span.start < end);
        if !touched {
            items.push(Item::Markup {
                raw: run.raw_markup(),
                element: None,
            });
            continue;
        }

        if !run.open.is_empty() {
            items.push(Item::Markup {
                raw: dialect.preserving_open_tag(&run.open),
                element: None,
            });
        }
        let mut pos = start;
        let mut index = first_span;
        while let Some(span) = spans.get(index).filter(|span| span.start < end) {
            if span.start >= start {
                if span.start > pos {
                    items.push(Item::Text(full[pos..span.start].to_string()));
                }
                items.push(Item::Tag(span.tag.clone()));
            }
            pos = pos.max(span.end.min(end));
            if span.end > end {
                break;
            }
            index += 1;
        }
        if pos < end {
            items.push(Item::Text(full[pos..end].to_string()));
        }
        first_span = index;
        if !run.close.is_empty() {
            items.push(Item::Markup {
                raw: run.close,
                element: None,
            });
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::lex;
    use pretty_assertions::assert_eq;

    fn scan_xml(xml: &str) -> Vec<Item> {
        let dialect = MarkupDialect::wordprocessing();
        scan(lex(xml, &dialect).unwrap(), &Delimiters::default(), &dialect)
    }

    fn tags(items: &[Item]) -> Vec<(TagKind, &str)> {
        items
            .iter()
            .filter_map(|item| match item {
                Item::Tag(tag) => Some((tag.kind, tag.expression.as_str())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tag_prefixes() {
        assert_eq!(Tag::parse("#items").kind, TagKind::Section);
        assert_eq!(Tag::parse(" ^ empty ").expression, "empty");
        assert_eq!(Tag::parse("/").kind, TagKind::Close);
        assert!(Tag::parse("#items").kind.opens_section());
        assert!(Tag::parse("^items").kind.opens_section());
        assert!(!Tag::parse("/items").kind.opens_section());
        assert_eq!(Tag::parse("/").expression, "");
        let tag = Tag::parse(" a | upper ");
        assert_eq!((tag.kind, tag.expression.as_str()), (TagKind::Substitution, "a | upper"));
        assert_eq!(tag.raw, " a | upper ");
    }

    #[test]
    fn test_single_run() {
        let items = scan_xml("<w:p><w:r><w:t>Hello {name}!</w:t></w:r></w:p>");
        assert_eq!(
            items[2..7].to_vec(),
            vec![
                Item::Markup {
                    raw: "<w:t xml:space=\"preserve\">".to_string(),
                    element: None
                },
                Item::Text("Hello ".to_string()),
                Item::Tag(Tag::parse("name")),
                Item::Text("!".to_string()),
                Item::Markup {
                    raw: "</w:t>".to_string(),
                    element: None
                },
            ]
        );
    }

    #[test]
    fn test_tag_split_across_runs() {
        let items = scan_xml(
            "<w:p><w:r><w:t>Dear {first</w:t></w:r><w:r><w:t>Name} and</w:t></w:r></w:p>",
        );
        assert_eq!(tags(&items), vec![(TagKind::Substitution, "firstName")]);
        let texts: Vec<_> = items
            .iter()
            .filter_map(|item| match item {
                Item::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["Dear ", " and"]);
    }

    #[test]
    fn test_untouched_runs_stay_verbatim() {
        let items = scan_xml("<w:p><w:r><w:t>a &amp; b</w:t></w:r></w:p>");
        assert!(items.contains(&Item::Markup {
            raw: "<w:t>a &amp; b</w:t>".to_string(),
            element: None
        }));
    }

    #[test]
    fn test_unclosed_and_stray_delimiters() {
        let items = scan_xml("<w:p><w:r><w:t>a } b {open {ok}</w:t></w:r></w:p>");
        assert_eq!(
            tags(&items),
            vec![(TagKind::Unclosed, ""), (TagKind::Substitution, "ok")]
        );
        assert!(items.contains(&Item::Text("a } b ".to_string())));
        assert!(items.contains(&Item::Text("open ".to_string())));
    }

    #[test]
    fn test_find_tags_on_long_brace_runs() {
        let text = format!("{}}}", "{".repeat(50_000));
        let spans = find_tags(&text, &Delimiters::default());
        assert_eq!(spans.len(), 50_000);
        assert!(spans[..49_999].iter().all(|s| s.tag.kind == TagKind::Unclosed));
        let last = &spans[49_999];
        assert_eq!((last.tag.kind, last.start, last.end), (TagKind::Substitution, 49_999, 50_001));

        let spans = find_tags("{a}{b} x} {c", &Delimiters::default());
        let found: Vec<_> = spans.iter().map(|s| (s.tag.kind, s.tag.raw.as_str())).collect();
        assert_eq!(
            found,
            vec![
                (TagKind::Substitution, "a"),
                (TagKind::Substitution, "b"),
                (TagKind::Unclosed, "c"),
            ]
        );
    }

    #[test]
    fn test_custom_delimiters() {
        let dialect = MarkupDialect::wordprocessing();
        let delimiters = Delimiters::new("[[", "]]");
        let chunks = lex("<w:t>{literal} [[#rows]][[.]][[/rows]]</w:t>", &dialect).unwrap();
        let items = scan(chunks, &delimiters, &dialect);
        assert_eq!(
            tags(&items),
            vec![
                (TagKind::Section, "rows"),
                (TagKind::Substitution, "."),
                (TagKind::Close, "rows"),
            ]
        );
    }
}
