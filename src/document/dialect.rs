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


//! Markup vocabularies of the supported document formats

use serde::{Deserialize, Serialize};

/// Describes where text lives in a part's markup and how structure is spelled
///
/// Only the content of text elements is scanned for placeholders. An empty
/// `text_elements` list makes every character data node scannable, which suits
/// plain XML parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupDialect {
    /// Qualified names of elements holding run text (`w:t`)
    pub text_elements: Vec<String>,
    /// Qualified name of the paragraph element (`w:p`); empty when there is none
    #[serde(default)]
    pub paragraph_element: String,
    /// Markup emitted for a newline in `linebreaks` mode, written inside a text element
    pub line_break: String,
    /// Whether rewritten text elements need `xml:space="preserve"`
    #[serde(default)]
    pub preserve_space: bool,
}

impl MarkupDialect {
    /// WordprocessingML (`.docx`)
    pub fn wordprocessing() -> Self {
        Self {
            text_elements: vec!["w:t".to_string()],
            paragraph_element: "w:p".to_string(),
            line_break: "</w:t><w:br/><w:t xml:space=\"preserve\">".to_string(),
            preserve_space: true,
        }
    }

    /// PresentationML / DrawingML text (`.pptx`)
    pub fn presentation() -> Self {
        Self {
            text_elements: vec!["a:t".to_string()],
            paragraph_element: "a:p".to_string(),
            line_break: "</a:t></a:r><a:br/><a:r><a:t>".to_string(),
            preserve_space: false,
        }
    }

    /// Plain XML: every text node is scanned, newlines stay newlines
    pub fn plain() -> Self {
        Self {
            text_elements: Vec::new(),
            paragraph_element: String::new(),
            line_break: "\n".to_string(),
            preserve_space: false,
        }
    }

    /// Whether `name` is a text element
    pub fn is_text_element(&self, name: &str) -> bool {
        self.text_elements.iter().any(|element| element == name)
    }

    /// Whether every character data node counts as text
    pub fn scans_all_text(&self) -> bool {
        self.text_elements.is_empty()
    }

    /// Whether `name` is the paragraph element
    pub fn is_paragraph(&self, name: &str) -> bool {
        !self.paragraph_element.is_empty() && self.paragraph_element == name
    }

    /// Start tag of a text element, with `xml:space="preserve"` added when needed
    pub fn preserving_open_tag(&self, open: &str) -> String {
        if !self.preserve_space || open.contains("xml:space") {
            return open.to_string();
        }
        match open.strip_suffix('>') {
            Some(head) => format!("{head} xml:space=\"preserve\">"),
            None => open.to_string(),
        }
    }
}

impl Default for MarkupDialect {
    fn default() -> Self {
        Self::wordprocessing()
    }
}
