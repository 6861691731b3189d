//! CSV rollup for archiving WAL session records.
//!
//! Converts the WAL into an append-only CSV history without losing records
//! if the process dies midway.

use crate::{Result, SessionRecord};
use chrono::Utc;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// A row in the CSV output
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsvRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exercise_name: String,
    pub(crate) duration_seconds: u32,
    pub(crate) started_at: Option<String>,
    pub(crate) completed_at: String,
    pub(crate) category: String,
}

impl From<&SessionRecord> for CsvRow {
    fn from(record: &SessionRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            user_id: record.user_id.clone(),
            exercise_name: record.exercise_name.clone(),
            duration_seconds: record.duration_seconds,
            started_at: record.started_at.map(|t| t.to_rfc3339()),
            completed_at: record.completed_at.to_rfc3339(),
            category: record.category.clone(),
        }
    }
}

/// Roll up WAL records into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all records from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to a timestamped `.wal.processed` archive
/// 5. Returns the number of records processed
///
/// The WAL is renamed rather than deleted so it can be recovered by hand.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(wal_path)?;

    if records.is_empty() {
        tracing::info!("No session records in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} session records to CSV", records.len());

    let processed_path = archive_path(wal_path);
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Unused archive name next to the WAL, e.g.
/// `practice_sessions.20260301T101500123456.wal.processed`
fn archive_path(wal_path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%6f").to_string();
    let mut candidate = wal_path.with_extension(format!("{}.wal.processed", stamp));
    let mut n = 1;
    while candidate.exists() {
        candidate = wal_path.with_extension(format!("{}-{}.wal.processed", stamp, n));
        n += 1;
    }
    candidate
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
