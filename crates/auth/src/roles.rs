use core::str::FromStr;

use serde::{Deserialize, Serialize};

use safeaid_core::DomainError;

/// Role identifier used for access control.
///
/// The set is closed: every account holds exactly one of these. Older clients
/// send `medical` for medical staff, so it is accepted as an alias on input and
/// always written back out as `medical_staff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    FieldAgent,
    #[serde(alias = "medical")]
    MedicalStaff,
    Trainer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::FieldAgent, Role::MedicalStaff, Role::Trainer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::FieldAgent => "field_agent",
            Role::MedicalStaff => "medical_staff",
            Role::Trainer => "trainer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "field_agent" => Ok(Role::FieldAgent),
            "medical_staff" | "medical" => Ok(Role::MedicalStaff),
            "trainer" => Ok(Role::Trainer),
            other => Err(DomainError::validation(format!(
                "role must be one of admin, field_agent, medical_staff, trainer (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medical_alias_parses_to_medical_staff() {
        assert_eq!("medical".parse::<Role>().unwrap(), Role::MedicalStaff);
        let role: Role = serde_json::from_str("\"medical\"").unwrap();
        assert_eq!(role, Role::MedicalStaff);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"medical_staff\"");
    }

    #[test]
    fn display_matches_wire_name() {
        for role in Role::ALL {
            let wire = serde_json::to_value(role).unwrap();
            assert_eq!(wire.as_str().unwrap(), role.to_string());
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn default_role_is_field_agent() {
        assert_eq!(Role::default(), Role::FieldAgent);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
    }
}
