//! Exercise catalog keyed by health condition.
//!
//! The bundled catalog is a TOML asset compiled into the crate. Alternative
//! catalogs can be loaded from disk with the same format.

use crate::{Condition, Error, ExerciseEntry, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Bundled catalog source
const DEFAULT_CATALOG_TOML: &str = include_str!("../assets/catalog.toml");

/// Cached default catalog - parsed once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| match Catalog::from_toml_str(DEFAULT_CATALOG_TOML) {
    Ok(catalog) => catalog,
    Err(e) => {
        tracing::error!("Bundled catalog failed to parse: {}", e);
        Catalog::default()
    }
});

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Parses a fresh copy of the bundled catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalogs.
pub fn build_default_catalog() -> Result<Catalog> {
    Catalog::from_toml_str(DEFAULT_CATALOG_TOML)
}

/// On-disk catalog format
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    exercise: Vec<RawExercise>,
}

/// Entry as written in the file; the condition is checked after parsing
#[derive(Debug, Deserialize)]
struct RawExercise {
    condition: String,
    name: String,
    benefits: String,
    instructions: String,
    image_url: String,
    video_url: String,
}

/// Immutable condition → exercise table
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: HashMap<Condition, Vec<ExerciseEntry>>,
}

impl Catalog {
    /// Build a catalog from entries, keeping their relative order per condition
    pub fn from_entries(entries: impl IntoIterator<Item = ExerciseEntry>) -> Self {
        let mut by_condition: HashMap<Condition, Vec<ExerciseEntry>> = HashMap::new();
        for entry in entries {
            by_condition.entry(entry.condition).or_default().push(entry);
        }
        Self {
            entries: by_condition,
        }
    }

    /// Parse a catalog from TOML text.
    ///
    /// Entries with an unknown condition key are skipped with a warning.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        let mut entries = Vec::with_capacity(file.exercise.len());

        for raw in file.exercise {
            let Some(condition) = Condition::from_key(&raw.condition) else {
                tracing::warn!(
                    "Skipping catalog entry '{}' for unknown condition '{}'",
                    raw.name,
                    raw.condition
                );
                continue;
            };
            entries.push(ExerciseEntry {
                condition,
                name: raw.name,
                benefits: raw.benefits,
                instructions: raw.instructions,
                image_url: raw.image_url,
                video_url: raw.video_url,
            });
        }

        Ok(Self::from_entries(entries))
    }

    /// Load a catalog file from disk
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded catalog from {:?} ({} entries)", path, catalog.len());
        Ok(catalog)
    }

    /// Entries addressing a condition, in catalog order
    pub fn entries_for(&self, condition: Condition) -> &[ExerciseEntry] {
        self.entries
            .get(&condition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First entry whose name matches, ignoring case.
    ///
    /// Conditions are searched in canonical order.
    pub fn find_by_name(&self, name: &str) -> Option<&ExerciseEntry> {
        let needle = name.trim().to_lowercase();
        Condition::ALL
            .iter()
            .flat_map(|c| self.entries_for(*c))
            .find(|e| e.name.to_lowercase() == needle)
    }

    /// Conditions that have at least one entry, in canonical order
    pub fn conditions(&self) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|c| !self.entries_for(*c).is_empty())
            .collect()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for condition in Condition::ALL {
            let mut seen = HashSet::new();
            for entry in self.entries_for(condition) {
                if entry.condition != condition {
                    errors.push(format!(
                        "Entry '{}' filed under '{}' but addresses '{}'",
                        entry.name, condition, entry.condition
                    ));
                }
                if entry.name.trim().is_empty() {
                    errors.push(format!("Entry under '{}' has empty name", condition));
                    continue;
                }
                if entry.benefits.trim().is_empty() {
                    errors.push(format!("Entry '{}' has empty benefits", entry.name));
                }
                if entry.instructions.trim().is_empty() {
                    errors.push(format!("Entry '{}' has empty instructions", entry.name));
                }
                for (kind, url) in [("image", &entry.image_url), ("video", &entry.video_url)] {
                    if !(url.starts_with("https://") || url.starts_with("http://")) {
                        errors.push(format!(
                            "Entry '{}' has invalid {} URL '{}'",
                            entry.name, kind, url
                        ));
                    }
                }
                if !seen.insert(entry.name.to_lowercase()) {
                    errors.push(format!(
                        "Duplicate entry '{}' under '{}'",
                        entry.name, condition
                    ));
                }
            }
        }

        errors
    }

    /// Validate and convert the error list into a single `Error`
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::CatalogValidation(errors.join("; ")))
        }
    }
}
