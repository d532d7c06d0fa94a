use serde::{Deserialize, Serialize};

/// Role claim carried in Cognito's `custom:role` attribute and mirrored in
/// the `Users` table. Serialized lowercase everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    /// Parses a role string; anything outside the enum is rejected.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "instructor" => Some(Role::Instructor),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserProfile {
    pub uid: String,
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub role: Role,
    pub created_at: i64,
}

/// One item of the `Enrollments` table. Read-only here; absent attributes
/// fall back to empty so exports never fail on sparse rows.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Enrollment {
    pub enrollment_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub enrol_date: Option<i64>,
}

// Request bodies
#[derive(Debug, Deserialize, Serialize)]
pub struct SetUserRoleRequest {
    pub uid: String,
    pub role: String,
}

/// Account-creation event payload delivered by the identity provider.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserCreatedEvent {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}
