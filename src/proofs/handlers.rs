use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Redirect,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    medications::repo,
    proofs::services,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ProofUploadResponse {
    pub success: bool,
    pub proof_photo: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/medications/:id/proof",
            post(upload_proof).get(get_proof),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

/// POST /medications/:id/proof (multipart, field `photo`)
#[instrument(skip(state, mp))]
pub async fn upload_proof(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<ProofUploadResponse>, ApiError> {
    let mut file: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("photo") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Upload(e.to_string()))?;
            file = Some((data, content_type));
        }
    }

    let (body, content_type) = file.ok_or_else(|| ApiError::Upload("No file uploaded".into()))?;

    let key = services::attach_proof(&state, user_id, id, body, &content_type).await?;

    info!(med_id = %id, %user_id, %key, "proof photo attached");
    Ok(Json(ProofUploadResponse {
        success: true,
        proof_photo: key,
    }))
}

/// GET /medications/:id/proof — 302 to a presigned url for the stored photo.
#[instrument(skip(state))]
pub async fn get_proof(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let med = repo::get_owned(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let key = med.proof_photo.ok_or(ApiError::NotFound)?;

    let url = services::presign_proof(&state, &key).await?;
    Ok(Redirect::temporary(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_shape() {
        let json = serde_json::to_string(&ProofUploadResponse {
            success: true,
            proof_photo: "proofs/u/m-p.jpg".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"proof_photo":"proofs/u/m-p.jpg"}"#
        );
    }
}
