use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    #[serde(alias = "GA")]
    Approver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Approver => "approver",
        }
    }

    /// Strict parse for user input. `GA` is the legacy name of the approver role.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            "approver" | "GA" => Some(Role::Approver),
            _ => None,
        }
    }

    /// Admins and approvers may read any booking; everyone else only their own.
    pub fn sees_all_bookings(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_legacy_approver_name() {
        assert_eq!(Role::parse("GA"), Some(Role::Approver));
        assert_eq!(Role::parse("approver"), Some(Role::Approver));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Role::Approver).unwrap();
        assert_eq!(json, "\"approver\"");
        let role: Role = serde_json::from_str("\"GA\"").unwrap();
        assert_eq!(role, Role::Approver);
    }

    #[test]
    fn test_booking_visibility() {
        assert!(Role::Admin.sees_all_bookings());
        assert!(Role::Approver.sees_all_bookings());
        assert!(!Role::Employee.sees_all_bookings());
    }
}
