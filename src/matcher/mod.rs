// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! First-match rule evaluation.
//!
//! The matcher is a pure function over an immutable [`RuleSet`] snapshot.
//! Rules are evaluated in stored order and the **first** satisfied rule
//! wins: first-match, not best-match, even when a later rule is more
//! specific. Precedence between header rules and prefix rules is therefore
//! purely positional.


use crate::config::{Rule, RuleSet};

/// Outcome of matching one request against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// A rule matched; the proxy transport should forward to this target.
    Target(String),
    /// No rule matched. Callers fall through to the default route; this is
    /// a normal outcome, never an error.
    NoMatch,
}

impl RoutingDecision {
    /// The matched target, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            RoutingDecision::Target(target) => Some(target),
            RoutingDecision::NoMatch => None,
        }
    }

    /// Consume the decision, yielding the matched target.
    pub fn into_target(self) -> Option<String> {
        match self {
            RoutingDecision::Target(target) => Some(target),
            RoutingDecision::NoMatch => None,
        }
    }
}

/// Find the first enabled rule satisfied by the request.
///
/// A rule is satisfied when its `header_value` exactly equals the request's
/// route header (case-sensitive), or when the request path starts with its
/// `path_prefix` (plain prefix test, no trailing-slash normalization;
/// stripping the prefix afterwards is the caller's concern).
pub fn first_match<'a>(
    header_value: Option<&str>,
    path: &str,
    rules: &'a RuleSet,
) -> Option<&'a Rule> {
    log::trace!(
        "matching header={header_value:?} path={path:?} against {} rules",
        rules.routes.len()
    );

    for rule in &rules.routes {
        if !rule.enabled {
            log::trace!("  rule '{}': disabled, skipped", rule.name);
            continue;
        }

        let header_hit = match (header_value, rule.header_value.as_deref()) {
            // An empty value on either side counts as absent, never a hit
            (Some(requested), Some(expected)) => {
                !requested.is_empty() && !expected.is_empty() && requested == expected
            }
            _ => false,
        };
        let path_hit = rule
            .path_prefix
            .as_deref()
            .is_some_and(|prefix| !prefix.is_empty() && path.starts_with(prefix));

        if header_hit || path_hit {
            log::debug!(
                "rule '{}' matched (header={header_hit}, path={path_hit}) -> {}",
                rule.name,
                rule.target
            );
            return Some(rule);
        }
    }

    log::debug!("no rule matched for header={header_value:?} path={path:?}");
    None
}

/// Match a request against a rule set, yielding a [`RoutingDecision`].
pub fn evaluate(header_value: Option<&str>, path: &str, rules: &RuleSet) -> RoutingDecision {
    match first_match(header_value, path, rules) {
        Some(rule) => RoutingDecision::Target(rule.target.clone()),
        None => RoutingDecision::NoMatch,
    }
}
