use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    medications::dto::{
        AdherenceResponse, CreateMedicationRequest, DeleteResponse, MedicationResponse,
        UpdateMedicationRequest,
    },
    medications::{repo, services},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/medications", get(list_medications))
        .route("/medications/adherence", get(get_adherence))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/medications", post(create_medication))
        .route(
            "/medications/:id",
            put(update_medication).delete(delete_medication),
        )
        .route("/medications/:id/take", post(take_medication))
}

fn require_fields(name: &str, dosage: &str, frequency: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || dosage.trim().is_empty() || frequency.trim().is_empty() {
        return Err(ApiError::InvalidInput("Invalid input".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<MedicationResponse>), ApiError> {
    require_fields(&payload.name, &payload.dosage, &payload.frequency)?;

    let med = repo::create(
        &state.db,
        user_id,
        payload.name.trim(),
        payload.dosage.trim(),
        payload.frequency.trim(),
    )
    .await?;

    info!(med_id = %med.id, %user_id, "medication created");
    Ok((StatusCode::CREATED, Json(med.into())))
}

#[instrument(skip(state))]
pub async fn list_medications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MedicationResponse>>, ApiError> {
    let meds = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(meds.into_iter().map(MedicationResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMedicationRequest>,
) -> Result<Json<MedicationResponse>, ApiError> {
    require_fields(&payload.name, &payload.dosage, &payload.frequency)?;

    let med = repo::update_fields(
        &state.db,
        user_id,
        id,
        payload.name.trim(),
        payload.dosage.trim(),
        payload.frequency.trim(),
    )
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(med.into()))
}

/// Deleting an absent or foreign medication still reports success; no other
/// record is touched either way.
#[instrument(skip(state))]
pub async fn delete_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let affected = repo::delete(&state.db, user_id, id).await?;
    if affected == 0 {
        debug!(med_id = %id, %user_id, "delete was a no-op");
    }
    Ok(Json(DeleteResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn take_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MedicationResponse>, ApiError> {
    let med = services::mark_taken(&state.db, user_id, id, services::today_utc()).await?;
    Ok(Json(med.into()))
}

#[instrument(skip(state))]
pub async fn get_adherence(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AdherenceResponse>, ApiError> {
    let meds = repo::list_by_user(&state.db, user_id).await?;
    let adherence = services::compute_adherence(&meds, services::today_utc());
    Ok(Json(AdherenceResponse { adherence }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected_before_store_access() {
        assert!(require_fields("Aspirin", "100mg", "daily").is_ok());
        assert!(require_fields("", "100mg", "daily").is_err());
        assert!(require_fields("Aspirin", "   ", "daily").is_err());
        assert!(require_fields("Aspirin", "100mg", "").is_err());
    }

    #[test]
    fn delete_response_shape() {
        let json = serde_json::to_string(&DeleteResponse { success: true }).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn adherence_response_shape() {
        let json = serde_json::to_string(&AdherenceResponse { adherence: 48 }).unwrap();
        assert_eq!(json, r#"{"adherence":48}"#);
    }
}
