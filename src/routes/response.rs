//! Response builders and request decoding shared by every route

use std::error::Error as StdError;

use bson::oid::ObjectId;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::types::ConnectorError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, x-auth-token";

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

pub fn ok_json<T: Serialize>(body: &T) -> Response<BoxBody> {
    json_response(StatusCode::OK, body)
}

/// Map an error onto its status and JSON body.
///
/// Validation failures use `{"errors": [{param, msg}]}`; everything else
/// `{"error", "code"}`. Server-side details only reach the log.
pub fn error_response(err: &ConnectorError) -> Response<BoxBody> {
    if err.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        debug!(error = %err, "Request rejected");
    }

    let body = match err {
        ConnectorError::Validation(errors) => json!({ "errors": errors }),
        other => json!({ "error": other.message(), "code": other.code() }),
    };
    json_response(err.status_code(), &body)
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert("Access-Control-Max-Age", HeaderValue::from_static("86400"));
    with_cors(response)
}

/// Collect a request body, refusing anything over `limit` bytes
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, ConnectorError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ConnectorError::BadRequest("Request body too large".into()))
        }
        Err(e) => Err(ConnectorError::Http(format!("Failed to read body: {}", e))),
    }
}

/// Decode a JSON body; an empty body reads as `{}` so validation can report fields
pub fn parse_json<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, ConnectorError> {
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };

    serde_json::from_slice(raw)
        .map_err(|e| ConnectorError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Parse a path id. Malformed ids cannot name anything, so they are `NotFound`.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ConnectorError> {
    ObjectId::parse_str(raw).map_err(|_| ConnectorError::NotFound(format!("{} not found", what)))
}
