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

//! Import configuration.

/// Configuration for an import pass.
///
/// # Examples
///
/// ## Default Configuration
///
/// ```rust
/// use strata_stream::ImportConfig;
///
/// let config = ImportConfig::default();
/// assert_eq!(config.buffer_size, 64 * 1024);
/// assert_eq!(config.max_depth, 100);
/// assert!(config.trim_text);
/// ```
///
/// ## Configuration for Untrusted Input
///
/// ```rust
/// use strata_stream::ImportConfig;
///
/// let config = ImportConfig {
///     max_depth: 32,          // Limit nesting
///     buffer_size: 16 * 1024, // Smaller buffer
///     ..ImportConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Buffer size for reading input.
    ///
    /// Default: 64KB
    pub buffer_size: usize,

    /// Maximum element nesting depth.
    ///
    /// Deeper elements fail the import with
    /// [`ImportError::DepthLimitExceeded`](crate::ImportError::DepthLimitExceeded).
    /// The context stack and the reader's open-element list are bounded by
    /// this value.
    ///
    /// Default: 100 levels
    pub max_depth: usize,

    /// Trim leading and trailing whitespace from text nodes.
    ///
    /// Whitespace-only text between elements is never reported, whatever
    /// this is set to.
    ///
    /// Default: true
    pub trim_text: bool,

    /// Report proxies that were never discharged as diagnostics at the end
    /// of the pass.
    ///
    /// Default: true
    pub report_undischarged: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            max_depth: 100,
            trim_text: true,
            report_undischarged: true,
        }
    }
}
