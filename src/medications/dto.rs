use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::medications::repo_types::Medication;

#[derive(Debug, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMedicationRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

/// Medication as returned to clients, ledger deserialized into a date list.
#[derive(Debug, Serialize)]
pub struct MedicationResponse {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub taken_dates: Vec<String>,
    pub proof_photo: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<Medication> for MedicationResponse {
    fn from(m: Medication) -> Self {
        let taken_dates = m.ledger().to_strings();
        Self {
            id: m.id,
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            taken_dates,
            proof_photo: m.proof_photo,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdherenceResponse {
    pub adherence: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_deserializes_ledger_column() {
        let med = Medication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "twice daily".into(),
            taken_dates: r#"["2026-03-02","2026-03-01"]"#.into(),
            proof_photo: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let resp = MedicationResponse::from(med);
        assert_eq!(resp.taken_dates, vec!["2026-03-01", "2026-03-02"]);
    }

    #[test]
    fn response_treats_malformed_ledger_as_empty() {
        let med = Medication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "twice daily".into(),
            taken_dates: "{broken".into(),
            proof_photo: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let resp = MedicationResponse::from(med);
        assert!(resp.taken_dates.is_empty());
    }
}
