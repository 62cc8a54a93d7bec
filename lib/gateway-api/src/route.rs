//! Route configuration model
//!
//! `RouteRecord` is the persisted shape: one row per routable path, created
//! and edited by an operator directly in the backing store. `RouteDefinition`
//! is the runtime shape handed to the dispatch stage: target URI plus ordered
//! predicate and filter specs.

use hyper::Uri;
use serde::{Deserialize, Serialize};

/// A persisted route configuration row. Read-only inside the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    /// Stable unique key for the route
    pub route_id: String,
    /// Upstream target base URI
    pub uri: String,
    /// Raw predicate expression; only a path pattern is supported today
    pub predicates: String,
    /// Optional raw filter expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    /// Disabled records never reach the route table
    pub enabled: bool,
}

/// A named predicate with ordered arguments, e.g. `Path` with one pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl PredicateSpec {
    /// Build a `Path` predicate for the given pattern.
    pub fn path(pattern: impl Into<String>) -> Self {
        Self {
            name: "Path".to_string(),
            args: vec![pattern.into()],
        }
    }

    /// The single path pattern, when this is a `Path` predicate.
    pub fn path_pattern(&self) -> Option<&str> {
        if self.name == "Path" {
            self.args.first().map(String::as_str)
        } else {
            None
        }
    }
}

/// A named filter with ordered arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// A runtime match-and-forward rule. Immutable once built; the whole table
/// is rebuilt on every refresh, never patched in place.
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    /// Copied verbatim from the record's route id
    pub id: String,
    /// Parsed absolute upstream URI
    pub target_uri: Uri,
    /// Ordered match conditions; always non-empty
    pub predicates: Vec<PredicateSpec>,
    /// Ordered filters for the forwarding stage; may be empty
    pub filters: Vec<FilterSpec>,
}

impl RouteDefinition {
    /// First `Path` pattern carried by this route, if any.
    pub fn path_pattern(&self) -> Option<&str> {
        self.predicates.iter().find_map(PredicateSpec::path_pattern)
    }
}
