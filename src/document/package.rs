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


//! In-memory document containers
//!
//! A template container is an ordered set of named parts. Only some of them
//! carry merge tags; which ones depends on the kind of document, detected from
//! the part names.

use super::dialect::MarkupDialect;
use crate::error::{MergeError, MergeResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

static WORD_TEMPLATE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$")
        .expect("valid word part pattern")
});

static SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide\d+\.xml$").expect("valid slide part pattern"));

/// Kind of document held by a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// Word processing document
    Word,
    /// Slide deck
    Presentation,
    /// Anything else; every XML part is a template part
    Generic,
}

impl PackageKind {
    /// Detect the kind from the part names
    pub fn detect<'n>(mut names: impl Iterator<Item = &'n str> + Clone) -> Self {
        if names.clone().any(|name| name == "word/document.xml") {
            Self::Word
        } else if names.any(|name| name.starts_with("ppt/slides/")) {
            Self::Presentation
        } else {
            Self::Generic
        }
    }

    /// Whether `name` is a part that may contain merge tags
    pub fn is_template_part(self, name: &str) -> bool {
        match self {
            Self::Word => WORD_TEMPLATE_PART.is_match(name),
            Self::Presentation => SLIDE_PART.is_match(name),
            Self::Generic => name.to_ascii_lowercase().ends_with(".xml"),
        }
    }

    /// Markup vocabulary of the template parts
    pub fn dialect(self) -> MarkupDialect {
        match self {
            Self::Word => MarkupDialect::wordprocessing(),
            Self::Presentation => MarkupDialect::presentation(),
            Self::Generic => MarkupDialect::plain(),
        }
    }
}

/// A named part of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    /// Path inside the container, `/` separated
    pub name: String,
    /// Raw bytes
    pub data: Vec<u8>,
    /// How the entry is compressed when the container is written
    pub compression: CompressionMethod,
}

impl PackagePart {
    /// Create a part; files are deflated and directories stored
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let compression = if name.ends_with('/') {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        Self {
            name,
            data: data.into(),
            compression,
        }
    }

    /// Create a part with an explicit compression method
    ///
    /// OpenDocument containers need their leading `mimetype` entry stored.
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// An ordered set of parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPackage {
    kind: PackageKind,
    parts: Vec<PackagePart>,
}

impl DocumentPackage {
    /// Build a package from parts, detecting its kind
    pub fn from_parts(parts: Vec<PackagePart>) -> Self {
        let kind = PackageKind::detect(parts.iter().map(|part| part.name.as_str()));
        Self { kind, parts }
    }

    /// Read a zip container
    pub fn read_zip(bytes: &[u8]) -> MergeResult<Self> {
        if bytes.is_empty() {
            return Err(MergeError::NoTemplate);
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| MergeError::malformed(None, format!("unreadable container: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| MergeError::malformed(None, format!("unreadable entry: {e}")))?;
            let name = file.name().to_string();
            let compression = file.compression();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| MergeError::malformed(Some(name.clone()), e.to_string()))?;
            parts.push(PackagePart {
                name,
                data,
                compression,
            });
        }

        let package = Self::from_parts(parts);
        log::debug!(
            "Read {:?} container with {} parts",
            package.kind,
            package.parts.len()
        );
        Ok(package)
    }

    /// Write the parts back into a zip container
    ///
    /// Parts keep their order and compression method, and every entry gets the
    /// same timestamp, so the same package always produces the same bytes.
    pub fn write_zip(&self) -> MergeResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for part in &self.parts {
            let options = FileOptions::default()
                .compression_method(part.compression)
                .last_modified_time(DateTime::default());
            if part.is_directory() {
                writer
                    .add_directory(part.name.as_str(), options)
                    .map_err(write_error)?;
                continue;
            }
            writer
                .start_file(part.name.as_str(), options)
                .map_err(write_error)?;
            writer.write_all(&part.data).map_err(write_error)?;
        }
        let cursor = writer.finish().map_err(write_error)?;
        Ok(cursor.into_inner())
    }

    /// Detected document kind
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// All parts in container order
    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Part by name
    pub fn part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Mutable part by name
    pub fn part_mut(&mut self, name: &str) -> Option<&mut PackagePart> {
        self.parts.iter_mut().find(|part| part.name == name)
    }

    /// Parts that may contain merge tags, in container order
    pub fn template_parts(&self) -> impl Iterator<Item = &PackagePart> {
        let kind = self.kind;
        self.parts
            .iter()
            .filter(move |part| !part.is_directory() && kind.is_template_part(&part.name))
    }

    /// Consume the package, returning its parts
    pub fn into_parts(self) -> Vec<PackagePart> {
        self.parts
    }
}

fn write_error(e: impl std::fmt::Display) -> MergeError {
    MergeError::malformed(None, format!("cannot write container: {e}"))
}
