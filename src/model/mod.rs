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

//! Data model for merge data
//!
//! Merge data is plain JSON: the host hands the engine a [`serde_json::Value`]
//! and every expression evaluates to one. [`ValueExt`] adds the conversions the
//! expression language and the filters rely on.

#![warn(missing_docs)]

mod value_ext;

pub use serde_json::{Map, Number, Value};
pub use value_ext::{ValueExt, number_value};
