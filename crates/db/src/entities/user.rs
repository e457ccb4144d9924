//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular user.
    User,
    /// Administrator: may list, edit, and delete any user.
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique username, immutable after creation
    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 password hash
    pub password_hash: String,

    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// Account activation state
    #[sea_orm(default_value = false)]
    pub active: bool,

    /// Single-use activation code; present only while `active` is false
    #[sea_orm(unique, nullable)]
    pub activation_code: Option<String>,

    /// Role set, stored as a JSON array of role names
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the stored role set.
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        serde_json::from_value(self.roles.clone()).unwrap_or_default()
    }

    /// Whether this user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles().contains(&Role::Admin)
    }
}

/// Encode a role set as the stored JSON representation.
#[must_use]
pub fn roles_json(roles: &[Role]) -> Json {
    serde_json::json!(roles)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_user(roles: Json) -> Model {
        Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2$test".to_string(),
            email: None,
            active: true,
            activation_code: None,
            roles,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "USER");
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ADMIN");
    }

    #[test]
    fn test_roles_round_trip() {
        let user = create_test_user(roles_json(&[Role::User, Role::Admin]));
        assert_eq!(user.roles(), vec![Role::User, Role::Admin]);
        assert!(user.is_admin());
    }

    #[test]
    fn test_regular_user_is_not_admin() {
        let user = create_test_user(roles_json(&[Role::User]));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_malformed_roles_parse_as_empty() {
        let user = create_test_user(serde_json::json!("not-an-array"));
        assert!(user.roles().is_empty());
        assert!(!user.is_admin());
    }
}
