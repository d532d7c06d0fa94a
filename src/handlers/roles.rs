//! Administrative role assignment handler.

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use lambda_http::{Body, Response};
use serde_json::{json, Value};

use crate::http::{internal_error, invalid_argument};
use crate::identity::{assign_role, RoleAssignmentError};
use crate::models::{Role, SetUserRoleRequest};

/// Validates a raw set-user-role request body into `(uid, role)`.
pub fn validate_set_role_request(req: &SetUserRoleRequest) -> Result<(&str, Role), String> {
    if req.uid.is_empty() {
        return Err("uid is required".to_string());
    }
    let role = Role::parse(&req.role)
        .ok_or_else(|| format!("role must be one of admin, instructor, student (got {:?})", req.role))?;
    Ok((&req.uid, role))
}

/// Overwrites the target's role claim and mirrors it into their profile.
///
/// TODO: require an admin group check before exposing this route publicly;
/// it currently trusts the API Gateway deployment to gate access.
///
/// # Database Interactions
/// - **Cognito**: `AdminUpdateUserAttributes` on `custom:role`.
/// - **`Users` Table**: `UpdateItem SET role` (role-only item if absent).
pub async fn handle_set_user_role(
    req: SetUserRoleRequest,
    cognito_client: &CognitoClient,
    dynamodb_client: &DynamoDbClient,
) -> Result<Value, Response<Body>> {
    let (uid, role) = validate_set_role_request(&req).map_err(|e| invalid_argument(&e))?;

    assign_role(uid, role, cognito_client, dynamodb_client)
        .await
        .map_err(|e| {
            match &e {
                RoleAssignmentError::Claim(_) => {
                    tracing::error!("Role assignment for {:?} failed before any write took effect: {}", uid, e.detail());
                }
                RoleAssignmentError::ProfileAfterClaim(_) => {
                    tracing::error!("Role claim for {:?} was set but the profile merge failed; stores are out of sync: {}", uid, e.detail());
                }
            }
            internal_error("Unable to update user role.")
        })?;

    Ok(json!({
        "message": format!(
            "Role {:?} assigned to user {:?}. The user must sign in again before the new role appears in their credential.",
            role.as_str(),
            uid
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_enum_roles() {
        for (raw, expected) in [
            ("admin", Role::Admin),
            ("instructor", Role::Instructor),
            ("student", Role::Student),
        ] {
            let req = SetUserRoleRequest {
                uid: "u1".to_string(),
                role: raw.to_string(),
            };
            let (uid, role) = validate_set_role_request(&req).unwrap();
            assert_eq!(uid, "u1");
            assert_eq!(role, expected);
        }
    }

    #[test]
    fn test_validate_rejects_out_of_enum_role() {
        let req = SetUserRoleRequest {
            uid: "u1".to_string(),
            role: "manager".to_string(),
        };
        assert!(validate_set_role_request(&req).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_uid() {
        let req = SetUserRoleRequest {
            uid: String::new(),
            role: "admin".to_string(),
        };
        assert!(validate_set_role_request(&req).is_err());
    }
}
