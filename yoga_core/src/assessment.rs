//! Health assessment storage.
//!
//! The assessment store is the only producer of condition sets. Each
//! submission replaces the user's previous assessment wholesale.

use crate::{ConditionSet, Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Source of users' current condition sets
pub trait AssessmentStore {
    /// Current conditions for a user; empty if they have never been assessed
    fn condition_set(&self, user_id: &str) -> Result<ConditionSet>;

    /// Replace a user's assessment
    fn replace(&mut self, user_id: &str, conditions: &ConditionSet) -> Result<()>;
}

/// One user's stored assessment.
///
/// Condition keys are stored as plain strings so files written with a larger
/// condition vocabulary still load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assessment {
    pub conditions: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// All assessments persisted in one file
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AssessmentFile {
    #[serde(default)]
    pub users: BTreeMap<String, Assessment>,
}

impl AssessmentFile {
    /// Load assessments from a file with shared locking
    ///
    /// Returns an empty set of assessments if the file doesn't exist.
    /// If the file is corrupted, logs a warning and starts empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No assessment file found, starting empty");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open assessment file {:?}: {}. Starting empty.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock assessment file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read assessment file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<AssessmentFile>(&contents) {
            Ok(assessments) => {
                tracing::debug!("Loaded {} assessments from {:?}", assessments.users.len(), path);
                Ok(assessments)
            }
            Err(e) => {
                tracing::warn!("Failed to parse assessment file {:?}: {}. Starting empty.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save assessments with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Assessment(format!("{:?} has no parent directory", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved assessments to {:?}", path);
        Ok(())
    }
}

/// File-backed assessment store
pub struct JsonAssessmentStore {
    path: PathBuf,
}

impl JsonAssessmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssessmentStore for JsonAssessmentStore {
    fn condition_set(&self, user_id: &str) -> Result<ConditionSet> {
        let assessments = AssessmentFile::load(&self.path)?;
        Ok(assessments
            .users
            .get(user_id)
            .map(|a| ConditionSet::from_keys(&a.conditions))
            .unwrap_or_default())
    }

    fn replace(&mut self, user_id: &str, conditions: &ConditionSet) -> Result<()> {
        let mut assessments = AssessmentFile::load(&self.path)?;
        assessments.users.insert(
            user_id.to_string(),
            Assessment {
                conditions: conditions.keys(),
                updated_at: Utc::now(),
            },
        );
        assessments.save(&self.path)?;
        tracing::info!(
            "Saved assessment for '{}' with {} conditions",
            user_id,
            conditions.len()
        );
        Ok(())
    }
}
