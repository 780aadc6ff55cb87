use sqlx::PgPool;
use time::{Date, Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::medications::repo;
use crate::medications::repo_types::Medication;

/// Trailing window length in days. The window runs from `today - 30 days`
/// through `today`, both ends inclusive, so every medication contributes
/// 31 expected doses. This matches the shipped behavior and is pinned by
/// tests; changing it silently would skew every user's score.
pub const ADHERENCE_WINDOW_DAYS: i64 = 30;

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Every calendar day in the trailing window, oldest first.
pub fn window_days(today: Date) -> Vec<Date> {
    let start = today.saturating_sub(Duration::days(ADHERENCE_WINDOW_DAYS));
    let mut days = Vec::with_capacity(ADHERENCE_WINDOW_DAYS as usize + 1);
    let mut day = start;
    while day <= today {
        days.push(day);
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Aggregate adherence percentage across all of a user's medications: one
/// expected dose per medication per window day, an actual dose when the day
/// is in that medication's ledger, rounded half-up. Zero medications is
/// defined as 0, not an error.
pub fn compute_adherence(meds: &[Medication], today: Date) -> i64 {
    if meds.is_empty() {
        return 0;
    }

    let days = window_days(today);
    let mut expected: u64 = 0;
    let mut actual: u64 = 0;

    for med in meds {
        let ledger = med.ledger();
        for day in &days {
            expected += 1;
            if ledger.contains(day) {
                actual += 1;
            }
        }
    }

    if expected == 0 {
        return 0;
    }
    ((actual as f64 / expected as f64) * 100.0).round() as i64
}

/// Record a dose for `day`. Owner-scoped read, idempotent set insert,
/// write-back. Two concurrent callers for the same day both compute the
/// same union, so the lost-update race cannot duplicate a date.
pub async fn mark_taken(
    db: &PgPool,
    user_id: Uuid,
    med_id: Uuid,
    day: Date,
) -> Result<Medication, ApiError> {
    let mut med = repo::get_owned(db, user_id, med_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut ledger = med.ledger();
    let changed = ledger.insert(day);
    let raw = ledger.to_json();
    repo::set_taken_dates(db, med.id, &raw).await?;

    if !changed {
        debug!(med_id = %med.id, "dose already marked for this day");
    }

    med.taken_dates = raw;
    Ok(med)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medications::repo_types::{format_day, TakenDates};
    use time::macros::date;

    fn med_with_ledger(raw: &str) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Aspirin".into(),
            dosage: "100mg".into(),
            frequency: "daily".into(),
            taken_dates: raw.to_string(),
            proof_photo: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn ledger_json(days: &[Date]) -> String {
        let mut ledger = TakenDates::default();
        for d in days {
            ledger.insert(*d);
        }
        ledger.to_json()
    }

    #[test]
    fn window_is_31_inclusive_days() {
        let today = date!(2026 - 03 - 15);
        let days = window_days(today);
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], date!(2026 - 02 - 13));
        assert_eq!(*days.last().unwrap(), today);
    }

    #[test]
    fn window_crosses_year_boundary() {
        let days = window_days(date!(2026 - 01 - 10));
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], date!(2025 - 12 - 11));
    }

    #[test]
    fn no_medications_is_zero() {
        assert_eq!(compute_adherence(&[], date!(2026 - 03 - 15)), 0);
    }

    #[test]
    fn empty_ledger_is_zero() {
        let meds = vec![med_with_ledger("[]")];
        assert_eq!(compute_adherence(&meds, date!(2026 - 03 - 15)), 0);
    }

    #[test]
    fn malformed_ledger_counts_as_all_missed() {
        let meds = vec![med_with_ledger("garbage")];
        assert_eq!(compute_adherence(&meds, date!(2026 - 03 - 15)), 0);
    }

    #[test]
    fn full_window_is_100() {
        let today = date!(2026 - 03 - 15);
        let meds = vec![med_with_ledger(&ledger_json(&window_days(today)))];
        assert_eq!(compute_adherence(&meds, today), 100);
    }

    #[test]
    fn fifteen_of_thirtyone_rounds_to_48() {
        // Window convention: 31 inclusive days. round(15 / 31 * 100) = 48.
        let today = date!(2026 - 03 - 15);
        let taken: Vec<Date> = window_days(today).into_iter().take(15).collect();
        let meds = vec![med_with_ledger(&ledger_json(&taken))];
        assert_eq!(compute_adherence(&meds, today), 48);
    }

    #[test]
    fn sixteen_of_thirtyone_rounds_up_to_52() {
        let today = date!(2026 - 03 - 15);
        let taken: Vec<Date> = window_days(today).into_iter().take(16).collect();
        let meds = vec![med_with_ledger(&ledger_json(&taken))];
        assert_eq!(compute_adherence(&meds, today), 52);
    }

    #[test]
    fn aggregates_across_medications() {
        let today = date!(2026 - 03 - 15);
        let full = med_with_ledger(&ledger_json(&window_days(today)));
        let empty = med_with_ledger("[]");
        // 31 of 62 expected doses taken.
        assert_eq!(compute_adherence(&[full, empty], today), 50);
    }

    #[test]
    fn dates_outside_window_do_not_count() {
        let today = date!(2026 - 03 - 15);
        let before = today.saturating_sub(Duration::days(ADHERENCE_WINDOW_DAYS + 1));
        let meds = vec![med_with_ledger(&ledger_json(&[before]))];
        assert_eq!(compute_adherence(&meds, today), 0);
    }

    #[test]
    fn window_days_format_as_calendar_strings() {
        let days = window_days(date!(2026 - 03 - 02));
        assert_eq!(format_day(days[0]).as_deref(), Some("2026-01-31"));
        assert_eq!(format_day(*days.last().unwrap()).as_deref(), Some("2026-03-02"));
    }
}
