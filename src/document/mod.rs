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


//! Document merge
//!
//! A template part goes through four stages: [`markup::lex`] splits the XML
//! into markup and text runs, [`tags::scan`] finds tags across runs,
//! [`section::build_tree`] pairs section markers and [`render::MergeSession`]
//! evaluates the tree against the data.

pub mod dialect;
pub mod markup;
pub mod package;
pub mod render;
pub mod section;
pub mod tags;

pub use dialect::MarkupDialect;
pub use markup::MarkupError;
pub use package::{DocumentPackage, PackageKind, PackagePart};
pub use render::{MergeSession, parse_part};
pub use section::Node;
pub use tags::{Tag, TagKind};
