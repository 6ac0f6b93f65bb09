// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-request routing entry point.
//!
//! [`Router::route`] is the one function the proxy transport calls for each
//! inbound request: it extracts the route header and path, snapshots the
//! active rule set, runs the matcher and hands back the target, or `None`,
//! meaning "no custom route, use the default". Routing never aborts request
//! handling: every failure mode along the way falls through to `None`.


use std::sync::Arc;

use crate::matcher;
use crate::store::ConfigStore;
use crate::trace;

/// The narrow seam to the HTTP server layer.
///
/// Implementations expose a header lookup (which may be case-sensitive,
/// hence the router probes several spellings) and whichever of the
/// original URL, current URL or path they have. An implementation for
/// [`http::Request`] is provided.
pub trait RouteRequest {
    /// Look up a header by the given name, exactly as spelled.
    fn header(&self, name: &str) -> Option<&str>;

    /// The original request URL, before any rewriting by intermediate
    /// layers.
    fn original_url(&self) -> Option<&str> {
        None
    }

    /// The current request URL.
    fn url(&self) -> Option<&str> {
        None
    }

    /// The request path.
    fn path(&self) -> Option<&str> {
        None
    }
}

impl<B> RouteRequest for http::Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        // http's header map is already case-insensitive on lookup.
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn url(&self) -> Option<&str> {
        self.uri().path_and_query().map(|pq| pq.as_str())
    }

    fn path(&self) -> Option<&str> {
        Some(self.uri().path())
    }
}

/// The public routing decision engine: a [`ConfigStore`] plus the matching
/// policy, invoked once per inbound request.
#[derive(Debug)]
pub struct Router {
    store: Arc<ConfigStore>,
}

impl Router {
    /// Create a router over the given config store.
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// The config store backing this router.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Decide the upstream target for one request.
    ///
    /// Returns `Some(target)` when a rule matched and `None` when the
    /// default route applies, a normal outcome, not an error. The decision
    /// is made against a single consistent rule-set snapshot; a reload
    /// completing mid-request cannot be observed half-applied.
    pub fn route<R: RouteRequest + ?Sized>(&self, request: &R) -> Option<String> {
        let rules = self.store.current();

        // The surrounding HTTP layer's header-casing normalization is not
        // guaranteed; probe the configured spelling plus upper and lower.
        let header_name = rules.settings.header_name.as_str();
        let header_value = request
            .header(header_name)
            .or_else(|| request.header(&header_name.to_uppercase()))
            .or_else(|| request.header(&header_name.to_lowercase()));

        // Prefer the original URL: intermediate layers may already have
        // rewritten the path.
        let path = request
            .original_url()
            .or_else(|| request.url())
            .or_else(|| request.path())
            .unwrap_or("");

        log::trace!("routing request: header[{header_name}]={header_value:?} path={path:?}");

        let log_file = rules.settings.log_file.as_deref();
        match matcher::first_match(header_value, path, &rules) {
            Some(rule) => {
                trace::record(
                    log_file,
                    &format!("matched rule '{}' -> {}", rule.name, rule.target),
                );
                Some(rule.target.clone())
            }
            None => {
                trace::record(log_file, "no match, using default route");
                None
            }
        }
    }
}
