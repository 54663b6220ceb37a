//! HTTP server implementation
//!
//! hyper http1 over `TokioIo`, one task per connection.

use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::logging;
use crate::routes::{self, BoxBody};
use crate::store::Store;
use crate::types::ConnectorError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Persistence backend (MongoDB, or in-memory in dev mode)
    pub store: Arc<dyn Store>,
    pub jwt: JwtValidator,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn Store>, jwt: JwtValidator) -> Self {
        Self {
            args,
            store,
            jwt,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ConnectorError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Connector listening on {} (store: {})",
        state.args.listen,
        state.store.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests and log one access line each
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = dispatch(state, req).await;

    logging::access_line(
        addr,
        &method,
        &path,
        response.status(),
        response.body().size_hint().exact(),
        started.elapsed(),
    );
    Ok(response)
}

/// Pick the handler for a request
pub async fn dispatch<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => routes::cors_preflight(),
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            routes::readiness_check(&state).await
        }
        (&Method::GET, "/version") => routes::version_info(),
        (_, p) if p == "/api" || p.starts_with("/api/") => {
            routes::handle_api_request(req, state).await
        }
        _ => routes::error_response(&ConnectorError::NotFound("Route not found".into())),
    }
}
