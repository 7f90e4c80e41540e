use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of actor roles known to the CRM. Authorization checks match on
/// this enum rather than raw strings so new roles force the compiler through
/// every gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Agent,
    Surveyor,
    Installer,
    Dispatch,
    Accounts,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}` (expected admin|agent|surveyor|installer|dispatch|accounts)")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
            Self::Surveyor => "surveyor",
            Self::Installer => "installer",
            Self::Dispatch => "dispatch",
            Self::Accounts => "accounts",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "surveyor" => Ok(Self::Surveyor),
            "installer" => Ok(Self::Installer),
            "dispatch" => Ok(Self::Dispatch),
            "accounts" => Ok(Self::Accounts),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, UnknownRole};

    #[test]
    fn role_round_trips_through_strings() {
        for role in [
            Role::Admin,
            Role::Agent,
            Role::Surveyor,
            Role::Installer,
            Role::Dispatch,
            Role::Accounts,
        ] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!("manager".parse::<Role>(), Err(UnknownRole("manager".to_string())));
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("  Installer ".parse::<Role>(), Ok(Role::Installer));
    }
}
