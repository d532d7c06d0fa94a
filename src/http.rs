//! HTTP utilities: response shaping, CORS, and the error-code taxonomy.

use lambda_http::{Body, Response};
use serde_json::{json, Value};

/// CORS origin header for all responses
pub fn get_cors_origin_header() -> (&'static str, &'static str) {
    ("Access-Control-Allow-Origin", "*")
}

/// Full CORS headers for OPTIONS preflight responses only
pub fn get_cors_preflight_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Access-Control-Allow-Origin", "*"),
        (
            "Access-Control-Allow-Headers",
            "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
        ),
        ("Access-Control-Allow-Methods", "GET,POST,OPTIONS"),
        ("Access-Control-Max-Age", "86400"),
    ]
}

/// Build an error response. `code` is one of the fixed codes clients key on:
/// `unauthenticated`, `permission-denied`, `invalid-argument`, `internal`.
pub fn error_response(status: u16, code: &str, message: &str) -> Response<Body> {
    let body = json!({
        "code": code,
        "message": message,
    });

    let (key, value) = get_cors_origin_header();
    Response::builder()
        .status(status)
        .header(key, value)
        .header("Content-Type", "application/json")
        .body(body.to_string().into())
        .expect("Couldn't create error response")
}

pub fn unauthenticated(message: &str) -> Response<Body> {
    error_response(401, "unauthenticated", message)
}

pub fn permission_denied(message: &str) -> Response<Body> {
    error_response(403, "permission-denied", message)
}

pub fn invalid_argument(message: &str) -> Response<Body> {
    error_response(400, "invalid-argument", message)
}

/// Generic 500. Callers log the underlying detail themselves; nothing about
/// the cause crosses the wire.
pub fn internal_error(message: &str) -> Response<Body> {
    error_response(500, "internal", message)
}

/// Build a successful response with CORS headers
pub fn success_response(status: u16, body: &str) -> Response<Body> {
    let (key, value) = get_cors_origin_header();
    Response::builder()
        .status(status)
        .header(key, value)
        .header("Content-Type", "application/json")
        .body(body.into())
        .expect("Couldn't create success response")
}

/// Handle CORS preflight requests
pub fn handle_options() -> Response<Body> {
    let mut response = Response::builder().status(200);

    for (key, value) in get_cors_preflight_headers() {
        response = response.header(key, value);
    }

    response
        .header("Content-Type", "application/json")
        .body(Body::Empty)
        .expect("Couldn't handle CORS request")
}

pub fn parse_json_body(body: &Body) -> Result<Value, Response<Body>> {
    let body_str = match body {
        Body::Empty => "{}",
        Body::Text(s) => s,
        Body::Binary(b) => match std::str::from_utf8(b) {
            Ok(s) => s,
            Err(_) => {
                return Err(invalid_argument("Could not parse request body as UTF-8"));
            }
        },
        _ => "{}",
    };

    serde_json::from_str(body_str)
        .map_err(|_| invalid_argument("Could not parse request body as JSON"))
}
