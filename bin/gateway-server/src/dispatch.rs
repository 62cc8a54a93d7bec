//! First-match-wins dispatch over the current route table

use gateway_api::RouteDefinition;
use gateway_core::DynamicRouteProvider;
use gateway_proxy::http::{internal_error_response, not_found_response};
use gateway_proxy::RequestForwarder;
use http_body_util::Full;
use hyper::{body::Bytes, Request, Response};
use std::sync::Arc;
use tracing::{debug, error};

/// Matches gate-approved requests against the route table and forwards them.
pub struct Dispatcher {
    provider: Arc<DynamicRouteProvider>,
    forwarder: Arc<RequestForwarder>,
}

impl Dispatcher {
    pub fn new(provider: Arc<DynamicRouteProvider>, forwarder: Arc<RequestForwarder>) -> Self {
        Self { provider, forwarder }
    }

    /// Route one request. Reads a fresh route table snapshot, takes the
    /// first route whose path pattern matches, and forwards upstream.
    pub async fn dispatch(
        &self,
        request: Request<hyper::body::Incoming>,
    ) -> Response<Full<Bytes>> {
        let routes = match self.provider.current_routes().await {
            Ok(routes) => routes,
            Err(e) => {
                error!("Route table unavailable: {}", e);
                return internal_error_response("route table unavailable");
            }
        };

        let path = request.uri().path().to_string();
        let route = match match_route(&routes, &path) {
            Some(route) => route,
            None => {
                debug!(path = %path, "No route matched");
                return not_found_response(&format!("no route matched {}", path));
            }
        };

        debug!(path = %path, route_id = %route.id, "Route matched");

        // Filters are carried for the forwarding stage; nothing here
        // interprets them yet.
        for filter in &route.filters {
            debug!(route_id = %route.id, filter = %filter.name, "Carrying route filter");
        }

        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or(path);
        let target = RequestForwarder::compose_target(&route.target_uri, &path_and_query);

        match self.forwarder.forward(&target, request).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Full::new(body))
            }
            Err(e) => {
                error!("Forwarding failed: {}", e);
                internal_error_response("forwarding failed")
            }
        }
    }
}

/// First route whose `Path` pattern matches, in table order.
pub fn match_route<'a>(routes: &'a [RouteDefinition], path: &str) -> Option<&'a RouteDefinition> {
    routes.iter().find(|route| {
        route
            .path_pattern()
            .map(|pattern| match_path(pattern, path))
            .unwrap_or(false)
    })
}

/// Match a request path against a route pattern.
///
/// Supported forms: exact match, `/prefix/*` (exactly one extra segment),
/// and `/prefix/**` (the prefix itself or anything below it).
pub fn match_path(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{}/", prefix));
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        if let Some(rest) = path.strip_prefix(&format!("{}/", prefix)) {
            return !rest.is_empty() && !rest.contains('/');
        }
        return false;
    }

    false
}
