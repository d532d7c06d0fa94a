//! New-account bootstrap: default role claim plus initial profile record.

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::identity::{merge_profile_role, set_role_claim};
use crate::models::{Role, UserCreatedEvent, UserProfile};

const DEFAULT_FULL_NAME: &str = "New Student User";

/// Display name for a fresh profile, falling back to the placeholder.
pub fn profile_full_name(display_name: Option<&str>) -> String {
    match display_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FULL_NAME.to_string(),
    }
}

/// Reacts to an account-creation event: every new account starts as a
/// student, and gets a `Users` item if one doesn't exist yet.
///
/// Errors propagate to the dispatching route arm, which logs them and still
/// acknowledges the event; there is no retry and no caller to notify.
///
/// # Database Interactions
/// - **Cognito**: `AdminUpdateUserAttributes` setting `custom:role` to student.
/// - **`Users` Table**: `GetItem`, then either a full `PutItem` or a
///   role-only `UpdateItem` merge.
pub async fn handle_user_created(
    user: UserCreatedEvent,
    cognito_client: &CognitoClient,
    dynamodb_client: &DynamoDbClient,
) -> Result<Value, String> {
    tracing::info!(
        "New user created: {} {} {:?}",
        user.uid,
        user.email,
        user.display_name
    );

    // Default claim is unconditional, whatever the account had before.
    set_role_claim(&user.uid, Role::Student, cognito_client).await?;

    let existing = dynamodb_client
        .get_item()
        .table_name("Users")
        .key("uid", AttributeValue::S(user.uid.clone()))
        .send()
        .await
        .map_err(|e| format!("Failed to get profile for {:?}: {:?}", user.uid, e))?;

    if existing.item.is_none() {
        let profile = UserProfile {
            uid: user.uid.clone(),
            full_name: profile_full_name(user.display_name.as_deref()),
            email: user.email.clone(),
            contact: String::new(),
            role: Role::Student,
            created_at: Utc::now().timestamp(),
        };
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&profile)
            .map_err(|e| format!("Failed to serialize profile for {:?}: {:?}", user.uid, e))?;

        dynamodb_client
            .put_item()
            .table_name("Users")
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| format!("Failed to create profile for {:?}: {:?}", user.uid, e))?;
        tracing::info!("Created profile record for {}", user.uid);
    } else {
        // Existing profile keeps its fields; only the role is re-stamped.
        merge_profile_role(&user.uid, Role::Student, dynamodb_client).await?;
        tracing::info!("Re-stamped existing profile for {} as student", user.uid);
    }

    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_full_name_uses_display_name() {
        assert_eq!(profile_full_name(Some("Ada Lovelace")), "Ada Lovelace");
    }

    #[test]
    fn test_profile_full_name_placeholder_when_absent() {
        assert_eq!(profile_full_name(None), "New Student User");
        assert_eq!(profile_full_name(Some("")), "New Student User");
    }
}
