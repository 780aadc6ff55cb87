use sqlx::PgPool;
use uuid::Uuid;

use crate::medications::repo_types::Medication;

/// Insert a new medication with an empty ledger.
pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    dosage: &str,
    frequency: &str,
) -> sqlx::Result<Medication> {
    sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (user_id, name, dosage, frequency, taken_dates)
        VALUES ($1, $2, $3, $4, '[]')
        RETURNING id, user_id, name, dosage, frequency, taken_dates, proof_photo, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(dosage)
    .bind(frequency)
    .fetch_one(db)
    .await
}

/// All medications owned by the user.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Medication>> {
    sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, user_id, name, dosage, frequency, taken_dates, proof_photo, created_at
        FROM medications
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Owner-scoped lookup: an existing-but-foreign medication comes back as
/// `None`, same as a missing one.
pub async fn get_owned(db: &PgPool, user_id: Uuid, med_id: Uuid) -> sqlx::Result<Option<Medication>> {
    sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, user_id, name, dosage, frequency, taken_dates, proof_photo, created_at
        FROM medications
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(med_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Replace the descriptive fields. The ledger and proof columns are never
/// part of this statement.
pub async fn update_fields(
    db: &PgPool,
    user_id: Uuid,
    med_id: Uuid,
    name: &str,
    dosage: &str,
    frequency: &str,
) -> sqlx::Result<Option<Medication>> {
    sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications
        SET name = $3, dosage = $4, frequency = $5
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, dosage, frequency, taken_dates, proof_photo, created_at
        "#,
    )
    .bind(med_id)
    .bind(user_id)
    .bind(name)
    .bind(dosage)
    .bind(frequency)
    .fetch_optional(db)
    .await
}

/// Owner-scoped delete. Returns the number of rows removed; zero is not an
/// error (delete is idempotent).
pub async fn delete(db: &PgPool, user_id: Uuid, med_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM medications
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(med_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Write back a serialized ledger. Ownership is checked by the read that
/// precedes this write.
pub async fn set_taken_dates(db: &PgPool, med_id: Uuid, taken_dates: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE medications
        SET taken_dates = $2
        WHERE id = $1
        "#,
    )
    .bind(med_id)
    .bind(taken_dates)
    .execute(db)
    .await?;
    Ok(())
}

/// Last-write-wins proof reference. Returns affected rows so callers can map
/// zero to not-found.
pub async fn set_proof_photo(
    db: &PgPool,
    user_id: Uuid,
    med_id: Uuid,
    key: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE medications
        SET proof_photo = $3
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(med_id)
    .bind(user_id)
    .bind(key)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    #[test]
    fn update_statement_never_touches_the_ledger() {
        // The UPDATE used by update_fields replaces descriptive fields only.
        let src = include_str!("repo.rs");
        let stmt = src
            .split("UPDATE medications")
            .nth(1)
            .and_then(|s| s.split("WHERE").next())
            .expect("update_fields statement present");
        assert!(stmt.contains("name"));
        assert!(!stmt.contains("taken_dates"));
        assert!(!stmt.contains("proof_photo"));
    }
}
