use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::medications::repo;
use crate::state::AppState;

const PRESIGN_TTL_SECS: u64 = 10 * 60;

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn proof_key(user_id: Uuid, med_id: Uuid, photo_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("proofs/{}/{}-{}.{}", user_id, med_id, photo_id, ext)
}

/// Store the uploaded photo and point the medication's single proof slot at
/// it, replacing any earlier reference. A zero-row update means the
/// medication is absent or foreign; the freshly written object is removed
/// best-effort before reporting not-found.
pub async fn attach_proof(
    st: &AppState,
    user_id: Uuid,
    med_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> Result<String, ApiError> {
    let key = proof_key(user_id, med_id, Uuid::new_v4(), content_type);
    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let affected = repo::set_proof_photo(&st.db, user_id, med_id, &key).await?;
    if affected == 0 {
        if let Err(e) = st.storage.delete_object(&key).await {
            warn!(error = %e, %key, "orphaned proof object left behind");
        }
        return Err(ApiError::NotFound);
    }

    Ok(key)
}

pub async fn presign_proof(st: &AppState, key: &str) -> Result<String, ApiError> {
    let url = st
        .storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for key {}", key))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[test]
    fn proof_key_scopes_by_owner_and_medication() {
        let user = Uuid::new_v4();
        let med = Uuid::new_v4();
        let photo = Uuid::new_v4();
        let key = proof_key(user, med, photo, "image/png");
        assert_eq!(
            key,
            format!("proofs/{}/{}-{}.png", user, med, photo)
        );
        let fallback = proof_key(user, med, photo, "application/pdf");
        assert!(fallback.ends_with(".bin"));
    }

    #[tokio::test]
    async fn presign_uses_storage_client() {
        let state = AppState::fake();
        let url = presign_proof(&state, "proofs/a/b-c.jpg").await.unwrap();
        assert!(url.contains("proofs/a/b-c.jpg"));
    }
}
