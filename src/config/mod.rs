// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule-set configuration model and parser.
//!
//! A rule document maps match conditions to upstream targets:
//!
//! | key                     | type     | default        | description                          |
//! |-------------------------|----------|----------------|--------------------------------------|
//! | `routes`                | *array*  | `[]`           | Ordered list of routing rules        |
//! | `routes[].name`         | string   | –              | Rule name, used in diagnostics       |
//! | `routes[].pathPrefix`   | string   | –              | Match when the path starts with this |
//! | `routes[].headerValue`  | string   | –              | Match when the route header equals   |
//! | `routes[].target`       | string   | –              | Opaque upstream identifier           |
//! | `routes[].enabled`      | bool     | `true`         | Disabled rules are never matched     |
//! | `settings.headerName`   | string   | `x-ccr-route`  | Header carrying the route hint       |
//! | `settings.logFile`      | string   | –              | Append-only diagnostic trace file    |
//!
//! Rule order is load-bearing: it is the precedence order, first match
//! wins. [`RuleSet::parse`] is a pure function from bytes to a validated,
//! immutable rule set; that purity is what lets the store hand a freshly
//! parsed set to concurrent readers atomically.

pub mod error;


pub use error::{ConfigError, ParseError};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default header consulted for an explicit route hint.
pub const DEFAULT_HEADER_NAME: &str = "x-ccr-route";

/// Supported file formats for rule documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON format (.json)
    Json,
    /// TOML format (.toml)
    Toml,
    /// YAML format (.yaml, .yml)
    Yaml,
}

impl FileFormat {
    /// Detect the file format from the file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| {
            let ext_str = ext.to_string_lossy().to_lowercase();
            match ext_str.as_str() {
                "json" => Some(FileFormat::Json),
                "toml" => Some(FileFormat::Toml),
                "yaml" | "yml" => Some(FileFormat::Yaml),
                _ => None,
            }
        })
    }
}

/// One routing rule: a match condition mapped to an upstream target.
///
/// At least one of `path_prefix` / `header_value` must be present and
/// non-empty, and an enabled rule must carry a non-empty `target`.
/// Immutable after parsing; a rule disappears only by being absent from the
/// next loaded rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule name, used in diagnostics only.
    pub name: String,
    /// Match when the request path starts with this exact prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    /// Match when the route header exactly equals this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_value: Option<String>,
    /// Opaque upstream identifier handed back to the proxy transport.
    #[serde(default)]
    pub target: String,
    /// Disabled rules are skipped entirely during matching.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form operator note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Check the rule invariants.
    fn validate(&self) -> Result<(), ParseError> {
        let has_prefix = self.path_prefix.as_deref().is_some_and(|p| !p.is_empty());
        let has_header = self.header_value.as_deref().is_some_and(|h| !h.is_empty());

        if !has_prefix && !has_header {
            return Err(ParseError::invalid_rule(
                &self.name,
                "neither pathPrefix nor headerValue is set",
            ));
        }
        if self.enabled && self.target.is_empty() {
            return Err(ParseError::invalid_rule(
                &self.name,
                "enabled rule has an empty target",
            ));
        }
        Ok(())
    }
}

/// Settings shared by the whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Name of the header carrying an explicit route hint.
    #[serde(default = "default_header_name")]
    pub header_name: String,
    /// Append-only diagnostic trace file. No trace file is written when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            log_file: None,
        }
    }
}

/// The complete, ordered rule collection plus settings, treated as one
/// atomic unit. A new instance wholesale-replaces the previous one on
/// reload; it is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// Rules in precedence order. First match wins.
    pub routes: Vec<Rule>,
    /// Shared settings.
    pub settings: Settings,
}

impl RuleSet {
    /// An empty rule set. Matching against it always yields no decision,
    /// which callers treat as "use the default route".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a rule document.
    ///
    /// Pure: no shared state is touched, so a failed parse cannot leave
    /// anything half-updated. Unknown fields are ignored for forward
    /// compatibility.
    pub fn parse(bytes: &[u8], format: FileFormat) -> Result<Self, ParseError> {
        let set: RuleSet = match format {
            FileFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| ParseError::Malformed(format!("invalid JSON: {e}")))?,
            FileFormat::Toml => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ParseError::Malformed(format!("invalid UTF-8: {e}")))?;
                toml::from_str(text)
                    .map_err(|e| ParseError::Malformed(format!("invalid TOML: {e}")))?
            }
            FileFormat::Yaml => serde_yaml::from_slice(bytes)
                .map_err(|e| ParseError::Malformed(format!("invalid YAML: {e}")))?,
        };

        for rule in &set.routes {
            rule.validate()?;
        }
        Ok(set)
    }
}
