use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

/// Medication record in the database. `taken_dates` holds the ledger as a
/// JSON array of `YYYY-MM-DD` strings; the column is opaque to the store and
/// parsed here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub taken_dates: String,
    pub proof_photo: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Medication {
    pub fn ledger(&self) -> TakenDates {
        TakenDates::parse(&self.taken_dates)
    }
}

pub(crate) fn parse_day(s: &str) -> Option<Date> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(s, fmt).ok()
}

pub(crate) fn format_day(day: Date) -> Option<String> {
    let fmt = format_description!("[year]-[month]-[day]");
    day.format(fmt).ok()
}

/// The set of calendar dates on which a dose was recorded taken for one
/// medication. Each date appears at most once; there is no removal
/// operation (doses cannot be un-marked).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TakenDates(BTreeSet<Date>);

impl TakenDates {
    /// Parse the raw column text. A malformed blob yields an empty ledger;
    /// entries that are not calendar dates are dropped.
    pub fn parse(raw: &str) -> Self {
        let entries: Vec<String> = serde_json::from_str(raw).unwrap_or_default();
        Self(entries.iter().filter_map(|s| parse_day(s)).collect())
    }

    /// Add a date if absent. Returns whether the ledger changed.
    pub fn insert(&mut self, day: Date) -> bool {
        self.0.insert(day)
    }

    pub fn contains(&self, day: &Date) -> bool {
        self.0.contains(day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ordered `YYYY-MM-DD` strings, as exposed in API responses.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().filter_map(|d| format_day(*d)).collect()
    }

    /// Serialize back to the column representation.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_strings()).unwrap_or_else(|_| "[]".to_string())
    }
}
