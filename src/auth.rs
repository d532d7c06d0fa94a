//! Credential parsing and role-claim checks.

use base64::{engine::general_purpose, Engine as _};
use lambda_http::Request;
use serde_json::Value;

use crate::models::Role;

/// Claims from the bearer token on a request, or None if no parseable
/// credential was presented.
///
/// The API Gateway authorizer has already validated the token signature
/// before the request reaches us, so the payload can be trusted as-is.
pub fn get_claims_from_event(event: &Request) -> Option<Value> {
    let auth_str = event
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);
    parse_jwt_payload(token)
}

/// The `custom:role` claim from a parsed payload. A missing or out-of-enum
/// value reads as no role at all.
pub fn role_from_claims(claims: &Value) -> Option<Role> {
    claims
        .get("custom:role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
}

/// Helper to decode and parse a JWT payload (without signature validation)
fn parse_jwt_payload(token: &str) -> Option<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    // JWT payload is the second part, base64url without padding
    let payload_part = parts[1];
    let padding = match payload_part.len() % 4 {
        2 => "==",
        3 => "=",
        _ => "",
    };
    let padded_payload = format!("{}{}", payload_part, padding);

    match general_purpose::URL_SAFE_NO_PAD
        .decode(payload_part)
        .or_else(|_| general_purpose::STANDARD.decode(&padded_payload))
    {
        Ok(decoded) => serde_json::from_slice(&decoded).ok(),
        Err(_) => None,
    }
}
