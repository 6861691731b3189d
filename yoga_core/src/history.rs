//! Practice history: recent session records and their summary.
//!
//! Loads records from both the live WAL and the archived CSV.

use crate::csv_rollup::CsvRow;
use crate::{Error, Result, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for SessionRecord {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let started_at = row
            .started_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(SessionRecord {
            id,
            user_id: row.user_id,
            exercise_name: row.exercise_name,
            duration_seconds: row.duration_seconds,
            started_at,
            completed_at,
            category: row.category,
        })
    }
}

/// Load records completed in the last N days from both WAL and CSV
///
/// Returns records sorted by completion time (newest first), with records
/// present in both sources counted once. A window reaching past the earliest
/// representable time covers all records.
pub fn load_recent_records(
    wal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<SessionRecord>> {
    if days < 0 {
        return Err(Error::Other(format!(
            "History window must not be negative, got {} days",
            days
        )));
    }
    let cutoff = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for record in crate::wal::read_records(wal_path)? {
            if record.completed_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} records from WAL", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if record.completed_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} records from CSV", csv_count);
    }

    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::info!(
        "Loaded {} session records from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

/// Load all records from a CSV file, skipping unreadable rows
fn load_records_from_csv(path: &Path) -> Result<Vec<SessionRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(Error::from).and_then(SessionRecord::try_from) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Failed to read CSV row: {}", e),
        }
    }

    Ok(records)
}

/// Aggregate view of completed practice
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PracticeSummary {
    pub sessions: usize,
    pub total_seconds: u64,
    /// Exercise names in the order they first appear in the input
    pub exercises: Vec<String>,
    pub by_category: BTreeMap<String, usize>,
}

impl PracticeSummary {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        let mut summary = Self::default();
        let mut seen = HashSet::new();

        for record in records {
            summary.sessions += 1;
            summary.total_seconds += u64::from(record.duration_seconds);
            if seen.insert(record.exercise_name.as_str()) {
                summary.exercises.push(record.exercise_name.clone());
            }
            *summary.by_category.entry(record.category.clone()).or_default() += 1;
        }

        summary
    }

    /// Only the records belonging to one user
    pub fn for_user(records: &[SessionRecord], user_id: &str) -> Self {
        let mine: Vec<SessionRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Self::from_records(&mine)
    }
}
