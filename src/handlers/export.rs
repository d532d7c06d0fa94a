//! Enrollment CSV export handler.

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{SecondsFormat, TimeZone, Utc};
use lambda_http::{Body, Request, Response};
use serde_json::{json, Value};
use std::time::Duration;

use crate::auth::{get_claims_from_event, role_from_claims};
use crate::http::{internal_error, permission_denied, unauthenticated};
use crate::models::{Enrollment, Role};

/// Fixed column order of the exported file.
pub const CSV_COLUMNS: [&str; 6] = [
    "enrollment_id",
    "user_id",
    "course_id",
    "status",
    "payment_status",
    "enrol_date",
];

const DOWNLOAD_LINK_TTL: Duration = Duration::from_secs(15 * 60);

/// Renders an epoch-second timestamp the way JS `toISOString()` does
/// (millisecond precision, `Z` suffix). Out-of-range values render empty.
pub fn iso_timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Serializes enrollments to CSV text with a header row. Standard quoting:
/// fields containing the delimiter, quotes, or newlines get quoted.
pub fn enrollments_to_csv(enrollments: &[Enrollment]) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| format!("Failed to write CSV header: {:?}", e))?;

    for e in enrollments {
        let enrol_date = e.enrol_date.map(iso_timestamp).unwrap_or_default();
        writer
            .write_record([
                e.enrollment_id.as_str(),
                e.user_id.as_str(),
                e.course_id.as_str(),
                e.status.as_str(),
                e.payment_status.as_str(),
                enrol_date.as_str(),
            ])
            .map_err(|e| format!("Failed to write CSV row: {:?}", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| format!("Failed to flush CSV writer: {:?}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV output was not UTF-8: {:?}", e))
}

/// Logs the failure detail server-side and hands the caller a generic 500.
fn export_failed(detail: &str) -> Response<Body> {
    tracing::error!("Error exporting enrollments: {}", detail);
    internal_error("Unable to export enrollments.")
}

/// Exports every enrollment to a timestamped CSV object in S3 and returns a
/// 15-minute presigned download link. Admin-only; the role is read from the
/// presented token, not re-fetched from the profile.
///
/// # Database Interactions
/// - **`Enrollments` Table**: full `Scan` (paginated, accumulated in memory).
/// - **S3 exports bucket**: `PutObject` then a presigned `GetObject`.
pub async fn handle_export_enrollments(
    event: &Request,
    dynamodb_client: &DynamoDbClient,
    s3_client: &S3Client,
) -> Result<Value, Response<Body>> {
    // Security checks run before any store access.
    let claims = get_claims_from_event(event)
        .ok_or_else(|| unauthenticated("The function must be called while authenticated."))?;

    if role_from_claims(&claims) != Some(Role::Admin) {
        return Err(permission_denied(
            "Only administrators can export enrollment data.",
        ));
    }

    // 1. Fetch the complete enrollment set
    let mut enrollments: Vec<Enrollment> = Vec::new();
    let mut paginator = dynamodb_client
        .scan()
        .table_name("Enrollments")
        .into_paginator()
        .items()
        .send();

    loop {
        let item_opt = paginator
            .try_next()
            .await
            .map_err(|e| export_failed(&format!("Failed to scan enrollments: {:?}", e)))?;

        match item_opt {
            Some(item) => {
                let enrollment: Enrollment = serde_dynamo::from_item(item).map_err(|e| {
                    export_failed(&format!("Failed to deserialize enrollment: {:?}", e))
                })?;
                enrollments.push(enrollment);
            }
            None => break,
        }
    }

    if enrollments.is_empty() {
        return Ok(json!({
            "downloadUrl": null,
            "message": "No enrollment data found.",
        }));
    }

    // 2. Serialize to CSV
    let csv_data = enrollments_to_csv(&enrollments).map_err(|e| export_failed(&e))?;

    // 3. Save the file to the exports bucket
    let bucket_name = std::env::var("EXPORTS_BUCKET_NAME")
        .map_err(|_| export_failed("EXPORTS_BUCKET_NAME environment variable not set"))?;

    let now = Utc::now();
    let object_key = format!(
        "exports/enrollments_{}.csv",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let download_token = now.timestamp_millis().to_string();

    s3_client
        .put_object()
        .bucket(&bucket_name)
        .key(&object_key)
        .body(ByteStream::from(csv_data.into_bytes()))
        .content_type("text/csv")
        .metadata("download-token", download_token)
        .send()
        .await
        .map_err(|e| export_failed(&format!("Failed to upload CSV to S3: {:?}", e)))?;

    // 4. Presign a read link for the client. The link outlives this
    // invocation; no cleanup of the object if presigning fails.
    let presigning_config = PresigningConfig::expires_in(DOWNLOAD_LINK_TTL)
        .map_err(|e| export_failed(&format!("Invalid presigning config: {:?}", e)))?;

    let presigned = s3_client
        .get_object()
        .bucket(&bucket_name)
        .key(&object_key)
        .presigned(presigning_config)
        .await
        .map_err(|e| export_failed(&format!("Failed to presign download URL: {:?}", e)))?;

    Ok(json!({ "downloadUrl": presigned.uri().to_string() }))
}
