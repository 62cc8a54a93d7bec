//! Translation from persisted route records to runtime route definitions

use crate::{CoreError, Result};
use gateway_api::{FilterSpec, PredicateSpec, RouteDefinition, RouteRecord};
use hyper::Uri;

/// Convert one persisted record into a runtime route definition.
///
/// A deliberately narrow 1:1 conversion: the stored predicate expression is
/// a single path pattern, and the optional filter expression yields a single
/// filter spec. The target types are sequences, so richer records are a
/// non-breaking extension. The source record is never mutated.
pub fn translate_route(record: &RouteRecord) -> Result<RouteDefinition> {
    // Stored values may carry incidental whitespace.
    let pattern = record.predicates.trim();
    if pattern.is_empty() {
        return Err(CoreError::BlankPredicate(record.route_id.clone()));
    }

    let target_uri = parse_target_uri(&record.route_id, &record.uri)?;

    let filters = match record.filters.as_deref().map(str::trim) {
        Some(expr) if !expr.is_empty() => vec![parse_filter(expr)],
        _ => Vec::new(),
    };

    Ok(RouteDefinition {
        id: record.route_id.clone(),
        target_uri,
        predicates: vec![PredicateSpec::path(pattern)],
        filters,
    })
}

/// Parse the stored upstream URI, requiring an absolute `scheme://authority`.
fn parse_target_uri(route_id: &str, raw: &str) -> Result<Uri> {
    let uri: Uri = raw
        .trim()
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| CoreError::InvalidTargetUri {
            route_id: route_id.to_string(),
            uri: raw.to_string(),
            reason: e.to_string(),
        })?;

    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(CoreError::InvalidTargetUri {
            route_id: route_id.to_string(),
            uri: raw.to_string(),
            reason: "target URI must be absolute".to_string(),
        });
    }

    Ok(uri)
}

/// Parse a filter expression of the form `Name` or `Name=a,b`.
fn parse_filter(expr: &str) -> FilterSpec {
    match expr.split_once('=') {
        Some((name, args)) => FilterSpec {
            name: name.trim().to_string(),
            args: args.split(',').map(|a| a.trim().to_string()).collect(),
        },
        None => FilterSpec::new(expr),
    }
}
