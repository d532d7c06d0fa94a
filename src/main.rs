mod auth;
mod handlers;
mod http;
mod identity;
mod models;

use aws_config::BehaviorVersion;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{run, service_fn, Body, Request, Response};

use handlers::{handle_export_enrollments, handle_set_user_role, handle_user_created};
use http::{error_response, handle_options, invalid_argument, parse_json_body, success_response};
use models::{SetUserRoleRequest, UserCreatedEvent};

/// Handle the Lambda event
async fn handle_lambda_event(
    event: Request,
    cognito_client: &CognitoClient,
    dynamodb_client: &DynamoDbClient,
    s3_client: &S3Client,
) -> Response<Body> {
    let method = event.method().as_str();
    let path = event.uri().path();

    // Strip /Prod or /prod prefix if it exists
    let path = if path.starts_with("/Prod") || path.starts_with("/prod") {
        &path[5..]
    } else {
        path
    };

    // Handle CORS preflight requests
    if method == "OPTIONS" {
        return handle_options();
    }

    // All operations are RPC-style POSTs
    if method != "POST" {
        return invalid_argument(&format!("Method '{}' is not supported", method));
    }

    // Route based on path and method
    match (path, method) {
        ("/export-enrollments", "POST") => {
            match handle_export_enrollments(&event, dynamodb_client, s3_client).await {
                Ok(value) => success_response(200, &value.to_string()),
                Err(response) => response,
            }
        }
        ("/set-user-role", "POST") => {
            let body = match parse_json_body(event.body()) {
                Ok(b) => b,
                Err(resp) => return resp,
            };

            let req: SetUserRoleRequest = match serde_json::from_value(body) {
                Ok(r) => r,
                Err(_) => return invalid_argument("uid and role are required"),
            };

            match handle_set_user_role(req, cognito_client, dynamodb_client).await {
                Ok(value) => success_response(200, &value.to_string()),
                Err(response) => response,
            }
        }
        ("/events/user-created", "POST") => {
            // Fire-and-forget event surface: the provider gets a 200
            // acknowledgement no matter what. Failures are log-only, with
            // no retry and nobody to notify.
            let body = match parse_json_body(event.body()) {
                Ok(b) => b,
                Err(_) => {
                    tracing::error!("Ignoring unparseable user-created event");
                    return success_response(200, "{}");
                }
            };

            match serde_json::from_value::<UserCreatedEvent>(body) {
                Ok(user) => {
                    if let Err(e) = handle_user_created(user, cognito_client, dynamodb_client).await
                    {
                        tracing::error!("Error bootstrapping new user account: {}", e);
                    }
                }
                Err(_) => {
                    tracing::error!("Ignoring user-created event with no uid");
                }
            }

            success_response(200, "{}")
        }
        _ => error_response(404, "invalid-argument", "No such operation"),
    }
}

/// Main Lambda handler function
async fn function_handler(event: Request) -> Result<Response<Body>, lambda_http::Error> {
    // Initialize AWS config and clients
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let cognito_client = CognitoClient::new(&config);
    let dynamodb_client = DynamoDbClient::new(&config);
    let s3_client = S3Client::new(&config);

    Ok(handle_lambda_event(event, &cognito_client, &dynamodb_client, &s3_client).await)
}

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    lambda_http::tracing::init_default_subscriber();
    run(service_fn(function_handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::get_claims_from_event;
    use crate::handlers::export::{enrollments_to_csv, iso_timestamp, CSV_COLUMNS};
    use crate::http::get_cors_preflight_headers;
    use crate::models::{Enrollment, Role};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    fn enrollment(id: &str, enrol_date: Option<i64>) -> Enrollment {
        Enrollment {
            enrollment_id: id.to_string(),
            user_id: "u1".to_string(),
            course_id: "c1".to_string(),
            status: "active".to_string(),
            payment_status: "paid".to_string(),
            enrol_date,
        }
    }

    #[test]
    fn test_cors_headers() {
        let headers = get_cors_preflight_headers();
        assert_eq!(headers.len(), 4);
        assert!(headers.iter().any(|(k, _)| *k == "Access-Control-Allow-Origin"));
    }

    #[test]
    fn test_error_response_format() {
        let response = error_response(403, "permission-denied", "Only administrators can export enrollment data.");
        assert_eq!(response.status(), 403);
        assert!(response.headers().contains_key("Access-Control-Allow-Origin"));
        let body = match response.body() {
            Body::Text(s) => s.clone(),
            _ => String::new(),
        };
        assert!(body.contains("\"code\":\"permission-denied\""));
    }

    #[test]
    fn test_handle_options() {
        let response = handle_options();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_success_response() {
        let response = success_response(200, "{}");
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_no_credential_yields_no_claims() {
        let request = lambda_http::http::Request::builder()
            .method("POST")
            .uri("/export-enrollments")
            .body(Body::Empty)
            .unwrap();
        assert!(get_claims_from_event(&request).is_none());
    }

    #[test]
    fn test_admin_credential_is_readable_from_header() {
        let payload = general_purpose::URL_SAFE_NO_PAD
            .encode(json!({ "sub": "u1", "custom:role": "admin" }).to_string());
        let token = format!("eyJhbGciOiJSUzI1NiJ9.{}.sig", payload);

        let request = lambda_http::http::Request::builder()
            .method("POST")
            .uri("/export-enrollments")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::Empty)
            .unwrap();

        let claims = get_claims_from_event(&request).unwrap();
        assert_eq!(crate::auth::role_from_claims(&claims), Some(Role::Admin));
    }

    #[test]
    fn test_csv_has_header_plus_one_line_per_enrollment() {
        let enrollments = vec![
            enrollment("e1", Some(1_700_000_000)),
            enrollment("e2", None),
        ];
        let csv = enrollments_to_csv(&enrollments).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        // Set date renders as ISO-8601, missing date as empty string
        assert_eq!(lines[1], "e1,u1,c1,active,paid,2023-11-14T22:13:20.000Z");
        assert_eq!(lines[2], "e2,u1,c1,active,paid,");
    }

    #[test]
    fn test_csv_quotes_fields_containing_delimiters() {
        let mut e = enrollment("e1", None);
        e.status = "on hold, pending payment".to_string();
        let csv = enrollments_to_csv(&[e]).unwrap();
        assert!(csv.contains("\"on hold, pending payment\""));
    }

    #[test]
    fn test_iso_timestamp_format() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_700_000_000), "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"instructor\"").unwrap(),
            Role::Instructor
        );
        assert!(serde_json::from_str::<Role>("\"manager\"").is_err());
    }

    #[test]
    fn test_parse_json_body_rejects_garbage() {
        assert!(parse_json_body(&Body::Text("not json".to_string())).is_err());
        assert!(parse_json_body(&Body::Text("{\"uid\":\"u1\"}".to_string())).is_ok());
        assert!(parse_json_body(&Body::Empty).is_ok());
    }
}
