// Dweve Strata - Streaming Record Import
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Strata CLI library for command-line parsing and execution.
//!
//! # Commands
//!
//! - **import**: run a declarative profile over an XML document and write the
//!   resulting records as JSON (array or NDJSON)
//! - **events**: print the normalized node event stream of a document
//!
//! # Examples
//!
//! ```no_run
//! use strata_cli::commands::{import, ImportOptions};
//!
//! # fn main() -> Result<(), strata_cli::error::CliError> {
//! let options = ImportOptions {
//!     ndjson: true,
//!     output: Some("accessions.ndjson".to_string()),
//!     ..ImportOptions::default()
//! };
//! import("accessions.xml", "schema.json", "profile.json", &options)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Inputs larger than 1 GB are rejected before reading; set
//! `STRATA_MAX_FILE_SIZE` (in bytes) to change the limit. Element nesting is
//! bounded by `--max-depth`.
//!
//! # Logging
//!
//! The binary logs through `tracing` to stderr. The filter is read from
//! `RUST_LOG`; `-v` raises the default level to debug, `-vv` to trace.

pub mod cli;
pub mod commands;
pub mod error;
pub mod profile;
