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


//! Markup lexing
//!
//! A part is split into a flat list of [`Chunk`]s: markup that is copied
//! through verbatim and the content of text elements, decoded so placeholders
//! can be found in it. Concatenating the raw form of every chunk reproduces
//! the input byte for byte.

use super::dialect::MarkupDialect;
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// The markup of a part is not well-formed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed markup at byte {position}: {message}")]
pub struct MarkupError {
    /// Byte offset where the problem was detected
    pub position: usize,
    /// Description from the XML reader
    pub message: String,
}

impl MarkupError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// How an element tag affects nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEvent {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name .../>`
    Empty,
}

/// Element information attached to a markup chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMark {
    /// Qualified element name
    pub name: String,
    /// Tag type
    pub event: ElementEvent,
}

/// Decoded content of one text element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Start tag as written (empty for bare character data)
    pub open: String,
    /// Content as written, entities and CDATA included
    pub raw: String,
    /// Decoded content
    pub content: String,
    /// End tag as written (empty for bare character data)
    pub close: String,
}

impl TextRun {
    /// The run exactly as it appeared in the part
    pub fn raw_markup(&self) -> String {
        let mut out = String::with_capacity(self.open.len() + self.raw.len() + self.close.len());
        out.push_str(&self.open);
        out.push_str(&self.raw);
        out.push_str(&self.close);
        out
    }
}

/// A lexed piece of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Markup copied through verbatim
    Markup {
        /// Text as written
        raw: String,
        /// Set for element tags
        element: Option<ElementMark>,
    },
    /// Text element content, scanned for placeholders
    Text(TextRun),
}

impl Chunk {
    fn element(raw: &str, name: String, event: ElementEvent) -> Self {
        Chunk::Markup {
            raw: raw.to_string(),
            element: Some(ElementMark { name, event }),
        }
    }

    fn other(raw: &str) -> Self {
        Chunk::Markup {
            raw: raw.to_string(),
            element: None,
        }
    }
}

struct PendingRun {
    name: String,
    open: String,
    raw: String,
    content: String,
}

/// Split `xml` into chunks, checking well-formedness on the way
pub fn lex(xml: &str, dialect: &MarkupDialect) -> Result<Vec<Chunk>, MarkupError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut chunks = Vec::new();
    let mut open_elements: Vec<String> = Vec::new();
    let mut pending: Option<PendingRun> = None;

    loop {
        let start = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|err| MarkupError::new(reader.buffer_position(), err.to_string()))?;
        let end = reader.buffer_position();
        let raw = &xml[start..end];

        match event {
            Event::Eof => break,
            Event::Text(text) => {
                let content = text
                    .unescape()
                    .map_err(|err| MarkupError::new(start, err.to_string()))?;
                push_text(&mut chunks, &mut pending, dialect, raw, &content);
            }
            Event::CData(_) => {
                let content = raw
                    .strip_prefix(CDATA_OPEN)
                    .and_then(|rest| rest.strip_suffix(CDATA_CLOSE))
                    .unwrap_or_default();
                push_text(&mut chunks, &mut pending, dialect, raw, content);
            }
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                flush_pending(&mut chunks, &mut pending);
                open_elements.push(name.clone());
                if dialect.is_text_element(&name) {
                    pending = Some(PendingRun {
                        name,
                        open: raw.to_string(),
                        raw: String::new(),
                        content: String::new(),
                    });
                } else {
                    chunks.push(Chunk::element(raw, name, ElementEvent::Open));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match open_elements.pop() {
                    Some(expected) if expected == name => {}
                    Some(expected) => {
                        return Err(MarkupError::new(
                            start,
                            format!("expected </{expected}>, found </{name}>"),
                        ));
                    }
                    None => {
                        return Err(MarkupError::new(start, format!("unexpected </{name}>")));
                    }
                }
                match pending.take() {
                    Some(run) if run.name == name => chunks.push(Chunk::Text(TextRun {
                        open: run.open,
                        raw: run.raw,
                        content: run.content,
                        close: raw.to_string(),
                    })),
                    other => {
                        pending = other;
                        flush_pending(&mut chunks, &mut pending);
                        chunks.push(Chunk::element(raw, name, ElementEvent::Close));
                    }
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                flush_pending(&mut chunks, &mut pending);
                chunks.push(Chunk::element(raw, name, ElementEvent::Empty));
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                flush_pending(&mut chunks, &mut pending);
                chunks.push(Chunk::other(raw));
            }
        }
    }

    if let Some(unclosed) = open_elements.last() {
        return Err(MarkupError::new(
            xml.len(),
            format!("element <{unclosed}> is never closed"),
        ));
    }
    Ok(chunks)
}

fn push_text(
    chunks: &mut Vec<Chunk>,
    pending: &mut Option<PendingRun>,
    dialect: &MarkupDialect,
    raw: &str,
    content: &str,
) {
    if let Some(run) = pending.as_mut() {
        run.raw.push_str(raw);
        run.content.push_str(content);
    } else if dialect.scans_all_text() {
        chunks.push(Chunk::Text(TextRun {
            open: String::new(),
            raw: raw.to_string(),
            content: content.to_string(),
            close: String::new(),
        }));
    } else {
        chunks.push(Chunk::other(raw));
    }
}

/// A text element that turned out to contain child elements is kept as
/// markup; the text collected so far still counts as run text.
fn flush_pending(chunks: &mut Vec<Chunk>, pending: &mut Option<PendingRun>) {
    let Some(run) = pending.take() else {
        return;
    };
    chunks.push(Chunk::element(&run.open, run.name, ElementEvent::Open));
    if !run.raw.is_empty() {
        chunks.push(Chunk::Text(TextRun {
            open: String::new(),
            raw: run.raw,
            content: run.content,
            close: String::new(),
        }));
    }
}
