use anyhow::Result;
use gateway_api::AuthenticationRequest;
use gateway_core::{DynamicRouteProvider, InMemoryRouteStore, RouteStore};
use gateway_proxy::http::{bad_request_response, json_response};
use gateway_proxy::{
    error_envelope, AuthGate, AuthPassthrough, AuthServiceClient, GateDecision, IdentityHeaders,
    MetricsCollector, MetricsMiddleware, MiddlewareChain, RequestContext, RequestForwarder,
    RequestLogMiddleware,
};
use gateway_store::{create_pool, PgRouteStore, StoreConfig};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::tokio::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dispatch;

use config::GatewayConfig;
use dispatch::Dispatcher;

/// Everything a request handler needs, wired once at startup.
struct AppState {
    gate: AuthGate,
    passthrough: AuthPassthrough,
    dispatcher: Dispatcher,
    middleware: MiddlewareChain,
    metrics: MetricsCollector,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting gateway-server...");

    let config = GatewayConfig::from_env();
    log_startup_config(&config);

    // Route table plumbing
    let store = build_store(&config).await?;
    let provider = Arc::new(DynamicRouteProvider::new(store));
    info!("Dynamic route provider initialized");

    // Authentication gate
    let identity = IdentityHeaders::new(
        &config.identity_headers.user_id,
        &config.identity_headers.username,
        &config.identity_headers.service_id,
        &config.identity_headers.account_type,
    )?;
    let validator = Arc::new(AuthServiceClient::new(
        config.validate_base(),
        config.validate_timeout,
    )?);
    let gate = AuthGate::new(validator, identity);
    info!("Authentication gate initialized");

    // Passthrough relay
    let passthrough = AuthPassthrough::new(config.authenticate_base(), config.validate_timeout)?;

    // Thin forwarding stage
    let forwarder = Arc::new(RequestForwarder::new(config.forward_timeout));
    let dispatcher = Dispatcher::new(provider.clone(), forwarder);
    info!(
        "Request forwarder initialized with {}s timeout",
        config.forward_timeout.as_secs()
    );

    // Observability
    let metrics = MetricsCollector::new()?;
    let middleware = MiddlewareChain::new()
        .add(RequestLogMiddleware)
        .add(MetricsMiddleware::new(metrics.clone()));
    info!("Middleware chain initialized with request logging and metrics");

    let state = Arc::new(AppState {
        gate,
        passthrough,
        dispatcher,
        middleware,
        metrics,
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    info!("API Gateway is UP and ready");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving connection from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Echo the resolved configuration at boot.
fn log_startup_config(config: &GatewayConfig) {
    info!("====== Startup Config Check ======");
    info!("Gateway Port: {}", config.port);
    info!("Auth Service Host: {}", config.auth_service_host);
    info!("Auth Service Port: {}", config.auth_service_port);
    info!("Validation Timeout: {:?}", config.validate_timeout);
    info!("Forward Timeout: {:?}", config.forward_timeout);
    info!("User ID Header: {}", config.identity_headers.user_id);
    info!("Username Header: {}", config.identity_headers.username);
    info!("Service ID Header: {}", config.identity_headers.service_id);
    info!("Account Type Header: {}", config.identity_headers.account_type);
    let store_kind = if config.database_url.is_some() {
        "postgres"
    } else {
        "in-memory"
    };
    info!("Route Store: {}", store_kind);
    info!("==================================");
}

/// Select the route store backend: PostgreSQL when a database is
/// configured, otherwise the in-memory fallback.
async fn build_store(config: &GatewayConfig) -> Result<Arc<dyn RouteStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(&StoreConfig::new(url.clone())).await?;
            let store = PgRouteStore::new(pool);
            store.ensure_schema().await?;
            info!("Route store initialized (PostgreSQL)");
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                "DATABASE_URL is not set - using an empty in-memory route store. \
                 No routes will match until records are added."
            );
            Ok(Arc::new(InMemoryRouteStore::new()))
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let context = RequestContext::from_request(&req);

    if let Err(e) = state.middleware.on_request(&context).await {
        debug!("Middleware on_request error: {}", e);
    }

    let response = route_request(req, &state).await;

    let status = response.status().as_u16();
    if let Err(e) = state.middleware.on_response(&context, status).await {
        debug!("Middleware on_response error: {}", e);
    }

    Ok(response)
}

/// The request pipeline: own endpoints first, then the authentication gate,
/// then dispatch over the route table.
async fn route_request(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if path == "/healthz" {
        return Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("OK\n")))
            .unwrap();
    }

    if path == "/metrics" && method == Method::GET {
        let metrics_text = state
            .metrics
            .gather()
            .unwrap_or_else(|_| "Failed to gather metrics\n".to_string());
        return Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(Full::new(Bytes::from(metrics_text)))
            .unwrap();
    }

    if path == "/artemis/authenticate" && method == Method::POST {
        return authenticate(req, state).await;
    }

    // Everything else is proxied and gated, gate first.
    match state.gate.apply(req).await {
        GateDecision::Deny(response) => {
            let decision = if response.status() == StatusCode::FORBIDDEN {
                "forbidden"
            } else {
                "unauthorized"
            };
            state.metrics.record_auth_decision(decision);
            response
        }
        GateDecision::Forward(req) => {
            state.metrics.record_auth_decision("forwarded");
            state.dispatcher.dispatch(req).await
        }
    }
}

/// Handle the passthrough authenticate endpoint.
async fn authenticate(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return bad_request_response(&format!("unreadable body: {}", e)),
    };

    let credentials: AuthenticationRequest = match serde_json::from_slice(&body) {
        Ok(credentials) => credentials,
        Err(e) => return bad_request_response(&format!("invalid credentials payload: {}", e)),
    };

    match state.passthrough.authenticate(&credentials).await {
        Ok(envelope) => json_response(StatusCode::OK, &envelope),
        Err(error) => {
            let (status, envelope) = error_envelope(&error);
            json_response(status, &envelope)
        }
    }
}
