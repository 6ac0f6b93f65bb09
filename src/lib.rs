// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Corsac - a configuration-driven request-routing decision engine for
//! reverse proxies.
//!
//! Corsac answers one question per inbound request: *which upstream target
//! should handle it?* The answer is driven by an ordered rule set loaded
//! from a configuration file and hot-reloadable at runtime. Corsac never
//! opens a socket; the surrounding proxy transport owns the wire and simply
//! asks Corsac for a decision.
//!
//! # Core Principles
//!
//! - **Determinism**: rules are evaluated in authored order; the first
//!   match wins, always.
//! - **Safety**: a reload failure never disturbs routing. The last-good
//!   rule set stays active, and any internal fault degrades to "no custom
//!   route", never to an aborted request.
//! - **Lock-free reads**: in-flight decisions take an immutable snapshot of
//!   the rule set; reloads publish a whole new snapshot atomically.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use corsac::{ConfigStore, Router};
//!
//! let store = Arc::new(ConfigStore::open("routes-config.json"));
//! let router = Router::new(store);
//!
//! let request = http::Request::builder()
//!     .uri("/glm/v1/messages")
//!     .body(())
//!     .unwrap();
//!
//! match router.route(&request) {
//!     Some(target) => println!("forward to {target}"),
//!     None => println!("no custom route, use the default"),
//! }
//! ```
//!
//! # Rule Documents
//!
//! A rule document is JSON (or TOML/YAML, selected by file extension):
//!
//! ```json
//! {
//!   "routes": [
//!     { "name": "glm", "headerValue": "glm", "target": "ZhiPu,glm-4.6" },
//!     { "name": "anthropic", "pathPrefix": "/anthropic",
//!       "target": "new-api-free,claude-sonnet4-5" }
//!   ],
//!   "settings": { "headerName": "x-ccr-route" }
//! }
//! ```

// Module declarations
pub mod config;
pub mod logging;
pub mod matcher;
pub mod router;
pub mod store;
pub mod trace;

// Re-export key types at the crate root for convenience
pub use config::{ConfigError, FileFormat, ParseError, Rule, RuleSet, Settings};
pub use matcher::{RoutingDecision, evaluate, first_match};
pub use router::{RouteRequest, Router};
pub use store::ConfigStore;
