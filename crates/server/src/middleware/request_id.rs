//! Request correlation IDs.
//!
//! Every response carries an `x-request-id`. An ID supplied by the proxy in
//! front of the server is reused only if it is a short token of ID
//! characters. Anything else is replaced with a fresh UUID v4. The chosen ID
//! goes on the `http_request` span and the Sentry scope so login audit events
//! can be tied back to a request.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID that is reused as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Tag incoming requests with a correlation ID and echo it in the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        upstream_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// The proxy-supplied ID, if it is safe to reuse.
fn upstream_request_id(headers: &HeaderMap) -> Option<String> {
    let id = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;

    let well_formed = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));

    well_formed.then(|| id.to_owned())
}
