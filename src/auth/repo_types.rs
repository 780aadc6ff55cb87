use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. Caretakers authenticate the same way as patients and see
/// only their own records; the role is carried in tokens for the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Caretaker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Caretaker => "caretaker",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "patient" => Ok(Role::Patient),
            "caretaker" => Ok(Role::Caretaker),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_column_text() {
        assert_eq!(Role::try_from("patient".to_string()).unwrap(), Role::Patient);
        assert_eq!(
            Role::try_from("caretaker".to_string()).unwrap(),
            Role::Caretaker
        );
        assert_eq!(Role::Patient.as_str(), "patient");
        assert_eq!(Role::Caretaker.as_str(), "caretaker");
    }

    #[test]
    fn role_rejects_unknown_text() {
        assert!(Role::try_from("admin".to_string()).is_err());
        assert!(Role::try_from("".to_string()).is_err());
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Patient).unwrap(), "\"patient\"");
        let r: Role = serde_json::from_str("\"caretaker\"").unwrap();
        assert_eq!(r, Role::Caretaker);
    }
}
