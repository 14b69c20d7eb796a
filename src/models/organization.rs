use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrganizationModel {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Membership roles, most privileged first.
pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";

/// True when `role` carries at least admin privileges.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_OWNER || role == ROLE_ADMIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privileges() {
        assert!(is_admin(ROLE_OWNER));
        assert!(is_admin(ROLE_ADMIN));
        assert!(!is_admin(ROLE_MEMBER));
        assert!(!is_admin("viewer"));
    }
}
