// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the configuration module.

use std::io;
use thiserror::Error;

/// Errors produced while turning raw bytes into a [`RuleSet`].
///
/// [`RuleSet`]: super::RuleSet
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document is not structurally valid for its format.
    #[error("malformed rule document: {0}")]
    Malformed(String),

    /// The document parsed, but a rule violates the rule invariants.
    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },
}

impl ParseError {
    /// Create a new invalid-rule error.
    pub fn invalid_rule(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the config store when (re)loading a rule set.
///
/// None of these are fatal to a running router: a failed reload leaves the
/// previously active rule set in place, and an unavailable source at
/// startup degrades to an empty rule set.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The source was read but could not be parsed into a valid rule set.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The configuration source is missing or unreadable.
    #[error("configuration source unavailable: {0}")]
    Unavailable(#[from] io::Error),

    /// The filesystem watcher could not be registered.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
