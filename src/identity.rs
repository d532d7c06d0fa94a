//! Identity service: the role claim lives in two places (the Cognito
//! `custom:role` attribute and the `Users` item), with no cross-store
//! transaction. This module owns both writes so callers get one operation
//! and a failure report that says how far it got.

use aws_sdk_cognitoidentityprovider::types::AttributeType;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;

use crate::models::Role;

/// How a role assignment failed. `ProfileAfterClaim` means the claim write
/// already landed and only the profile mirror is stale; the two stores are
/// out of sync until someone re-runs the assignment.
#[derive(Debug)]
pub enum RoleAssignmentError {
    Claim(String),
    ProfileAfterClaim(String),
}

impl RoleAssignmentError {
    pub fn detail(&self) -> &str {
        match self {
            RoleAssignmentError::Claim(d) => d,
            RoleAssignmentError::ProfileAfterClaim(d) => d,
        }
    }
}

/// Sets the `custom:role` attribute on the Cognito user. Tokens already
/// issued keep their old claim until the user signs in again.
pub async fn set_role_claim(
    uid: &str,
    role: Role,
    cognito_client: &CognitoClient,
) -> Result<(), String> {
    let user_pool_id = std::env::var("USER_POOL_ID")
        .map_err(|_| "USER_POOL_ID environment variable not set".to_string())?;

    let role_attr = AttributeType::builder()
        .name("custom:role")
        .value(role.as_str())
        .build()
        .map_err(|e| format!("Failed to build role attribute: {:?}", e))?;

    cognito_client
        .admin_update_user_attributes()
        .user_pool_id(&user_pool_id)
        .username(uid)
        .user_attributes(role_attr)
        .send()
        .await
        .map_err(|e| format!("Failed to set role claim for {:?}: {:?}", uid, e))?;

    Ok(())
}

/// Merges `{role}` into the `Users` item, touching nothing else. UpdateItem
/// creates a role-only item when no profile exists yet.
pub async fn merge_profile_role(
    uid: &str,
    role: Role,
    dynamodb_client: &DynamoDbClient,
) -> Result<(), String> {
    dynamodb_client
        .update_item()
        .table_name("Users")
        .key("uid", AttributeValue::S(uid.to_string()))
        .update_expression("SET #r = :role")
        .expression_attribute_names("#r", "role")
        .expression_attribute_values(":role", AttributeValue::S(role.as_str().to_string()))
        .send()
        .await
        .map_err(|e| format!("Failed to merge role into profile for {:?}: {:?}", uid, e))?;

    Ok(())
}

/// Assigns a role authoritatively: claim first, then the profile mirror.
pub async fn assign_role(
    uid: &str,
    role: Role,
    cognito_client: &CognitoClient,
    dynamodb_client: &DynamoDbClient,
) -> Result<(), RoleAssignmentError> {
    set_role_claim(uid, role, cognito_client)
        .await
        .map_err(RoleAssignmentError::Claim)?;

    merge_profile_role(uid, role, dynamodb_client)
        .await
        .map_err(RoleAssignmentError::ProfileAfterClaim)?;

    Ok(())
}
