//! Account role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use gatehouse_core::AppError;

/// Roles an account may hold.
///
/// Role checks are exact matches; there is no implied hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Regular account.
    User,
    /// Delegated administrator, usually holding unit-scoped grants.
    Admin,
    /// Manager, usually holding global grants.
    Manager,
}

impl AccountRole {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            _ => Err(AppError::validation(format!(
                "Invalid account role: '{s}'. Expected one of: user, admin, manager"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("manager".parse::<AccountRole>().unwrap(), AccountRole::Manager);
        assert_eq!("ADMIN".parse::<AccountRole>().unwrap(), AccountRole::Admin);
        assert!("viewer".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AccountRole::Manager).unwrap();
        assert_eq!(json, "\"manager\"");
        let role: AccountRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, AccountRole::User);
    }
}
