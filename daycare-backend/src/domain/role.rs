// src/domain/role.rs

use serde::{Deserialize, Serialize};

/// 呼び出し元のロール。認証レイヤーが発行するクレームに載る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Parent,
    Educator,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Parent => "PARENT",
            UserRole::Educator => "EDUCATOR",
            UserRole::Admin => "ADMIN",
            UserRole::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PARENT" => Some(UserRole::Parent),
            "EDUCATOR" => Some(UserRole::Educator),
            "ADMIN" => Some(UserRole::Admin),
            "SUPER_ADMIN" => Some(UserRole::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [
            UserRole::Parent,
            UserRole::Educator,
            UserRole::Admin,
            UserRole::SuperAdmin,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("OWNER"), None);
    }
}
