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


//! Shared builders for integration tests

#![allow(dead_code)]

use docmerge::{DocumentPackage, MergeEngine, MergeOptions, PackagePart};
use serde_json::Value;

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

/// `<w:p>` holding one run with `text`
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
}

/// `<w:p>` whose text is split over several runs
pub fn split_paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| format!("<w:r><w:rPr><w:b/></w:rPr><w:t>{text}</w:t></w:r>"))
        .collect();
    format!("<w:p>{runs}</w:p>")
}

/// A `word/document.xml` body holding `paragraphs`
pub fn document_xml(paragraphs: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        paragraphs.concat()
    )
}

/// In-memory word processing package
pub fn docx_package(paragraphs: &[String]) -> DocumentPackage {
    DocumentPackage::from_parts(vec![
        PackagePart::new("[Content_Types].xml", CONTENT_TYPES),
        PackagePart::new("word/document.xml", document_xml(paragraphs)),
        PackagePart::new("word/styles.xml", "<w:styles/>"),
    ])
}

/// Zipped word processing package
pub fn docx_bytes(paragraphs: &[String]) -> Vec<u8> {
    docx_package(paragraphs)
        .write_zip()
        .expect("test package should zip")
}

/// Text of a part
pub fn part_text(package: &DocumentPackage, name: &str) -> String {
    let part = package.part(name).expect("part should exist");
    String::from_utf8(part.data.clone()).expect("part should be UTF-8")
}

/// Concatenated `w:t` text of the main document part, one line per paragraph
pub fn visible_text(package: &DocumentPackage) -> String {
    let xml = part_text(package, "word/document.xml");
    let mut out = String::new();
    let mut rest = xml.as_str();
    while let Some(start) = rest.find("<w:t") {
        let after = &rest[start..];
        let Some(open_end) = after.find('>') else { break };
        if after[..open_end].ends_with('/') {
            rest = &after[open_end + 1..];
            continue;
        }
        let body = &after[open_end + 1..];
        let Some(close) = body.find("</w:t>") else { break };
        out.push_str(&body[..close]);
        rest = &body[close..];
        if let Some(p) = rest.find("</w:t>") {
            let tail = &rest[p + 6..];
            if tail.starts_with("</w:r></w:p>") {
                out.push('\n');
            }
            rest = tail;
        }
    }
    out
}

/// Merge and return the merged package, panicking on any failure
pub fn merge_ok(paragraphs: &[String], data: &Value, options: &MergeOptions) -> DocumentPackage {
    MergeEngine::default()
        .merge(&docx_package(paragraphs), data, options)
        .expect("merge should succeed")
}
