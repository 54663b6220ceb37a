//! Logging infrastructure for Connector
//!
//! `tracing` subscriber setup plus the per-request access line.

use std::net::SocketAddr;
use std::time::Duration;

use hyper::{Method, StatusCode};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Args;

/// Target used for access lines, so they can be filtered separately
pub const ACCESS_TARGET: &str = "connector::access";

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(log_level: &str) -> String {
    format!("connector={},info", log_level)
}

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&args.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// `GET /api/posts 200 512 - 3.214 ms`
pub fn format_access(
    method: &Method,
    path: &str,
    status: StatusCode,
    length: Option<u64>,
    elapsed: Duration,
) -> String {
    let length = length.map_or_else(|| "-".to_string(), |l| l.to_string());
    format!(
        "{} {} {} {} - {:.3} ms",
        method,
        path,
        status.as_u16(),
        length,
        elapsed.as_secs_f64() * 1000.0
    )
}

/// One line per request, in the compact "tiny" shape
pub fn access_line(
    addr: SocketAddr,
    method: &Method,
    path: &str,
    status: StatusCode,
    length: Option<u64>,
    elapsed: Duration,
) {
    info!(
        target: ACCESS_TARGET,
        peer = %addr,
        "{}",
        format_access(method, path, status, length, elapsed)
    );
}
