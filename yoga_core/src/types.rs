//! Core domain types for the yoga practice system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Health conditions and condition sets
//! - Catalog exercise entries and recommendations
//! - Exercise metadata attached to a practice session
//! - Session records emitted on completion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Conditions
// ============================================================================

/// A self-reported health concern.
///
/// Variant order is the canonical order used when iterating a [`ConditionSet`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    BackPain,
    NeckPain,
    Stress,
    Insomnia,
    DigestiveIssues,
    JointPain,
    HighBloodPressure,
    Obesity,
    RespiratoryIssues,
    Diabetes,
    Arthritis,
    Anxiety,
    Depression,
    Migraine,
    Thyroid,
    HeartDisease,
    Asthma,
    Allergies,
}

impl Condition {
    /// Every known condition, in canonical order
    pub const ALL: [Condition; 18] = [
        Condition::BackPain,
        Condition::NeckPain,
        Condition::Stress,
        Condition::Insomnia,
        Condition::DigestiveIssues,
        Condition::JointPain,
        Condition::HighBloodPressure,
        Condition::Obesity,
        Condition::RespiratoryIssues,
        Condition::Diabetes,
        Condition::Arthritis,
        Condition::Anxiety,
        Condition::Depression,
        Condition::Migraine,
        Condition::Thyroid,
        Condition::HeartDisease,
        Condition::Asthma,
        Condition::Allergies,
    ];

    /// Stable storage and catalog key
    pub fn key(self) -> &'static str {
        match self {
            Condition::BackPain => "back_pain",
            Condition::NeckPain => "neck_pain",
            Condition::Stress => "stress",
            Condition::Insomnia => "insomnia",
            Condition::DigestiveIssues => "digestive_issues",
            Condition::JointPain => "joint_pain",
            Condition::HighBloodPressure => "high_blood_pressure",
            Condition::Obesity => "obesity",
            Condition::RespiratoryIssues => "respiratory_issues",
            Condition::Diabetes => "diabetes",
            Condition::Arthritis => "arthritis",
            Condition::Anxiety => "anxiety",
            Condition::Depression => "depression",
            Condition::Migraine => "migraine",
            Condition::Thyroid => "thyroid",
            Condition::HeartDisease => "heart_disease",
            Condition::Asthma => "asthma",
            Condition::Allergies => "allergies",
        }
    }

    /// Parse a storage key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Label shown on the assessment form
    pub fn label(self) -> &'static str {
        match self {
            Condition::BackPain => "Back Pain",
            Condition::NeckPain => "Neck Pain",
            Condition::Stress => "Stress",
            Condition::Insomnia => "Insomnia",
            Condition::DigestiveIssues => "Digestive Issues",
            Condition::JointPain => "Joint Pain",
            Condition::HighBloodPressure => "High Blood Pressure",
            Condition::Obesity => "Weight Management",
            Condition::RespiratoryIssues => "Respiratory Issues",
            Condition::Diabetes => "Diabetes",
            Condition::Arthritis => "Arthritis",
            Condition::Anxiety => "Anxiety",
            Condition::Depression => "Depression",
            Condition::Migraine => "Migraine",
            Condition::Thyroid => "Thyroid Issues",
            Condition::HeartDisease => "Heart Disease",
            Condition::Asthma => "Asthma",
            Condition::Allergies => "Allergies",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Condition::BackPain => "Pain in the lower, middle, or upper back",
            Condition::NeckPain => "Stiffness or pain in the neck area",
            Condition::Stress => "Feeling overwhelmed or tense",
            Condition::Insomnia => "Difficulty falling or staying asleep",
            Condition::DigestiveIssues => "Problems with digestion, bloating, or gut health",
            Condition::JointPain => "Pain in joints like knees, shoulders, or hips",
            Condition::HighBloodPressure => "Elevated blood pressure readings",
            Condition::Obesity => "Desire to manage or reduce weight",
            Condition::RespiratoryIssues => "Breathing problems or allergies",
            Condition::Diabetes => "Type 1 or Type 2 diabetes",
            Condition::Arthritis => "Joint inflammation and stiffness",
            Condition::Anxiety => "Excessive worry or fear",
            Condition::Depression => "Persistent feelings of sadness or loss of interest",
            Condition::Migraine => "Severe headaches, often with other symptoms",
            Condition::Thyroid => "Thyroid gland disorders",
            Condition::HeartDisease => "Diagnosed heart or circulatory conditions",
            Condition::Asthma => "Recurring airway narrowing or wheezing",
            Condition::Allergies => "Seasonal or environmental allergies",
        }
    }

    /// Key with underscores replaced by spaces (e.g. "back pain")
    pub fn display_key(self) -> String {
        self.key().replace('_', " ")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Condition {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_key(s).ok_or_else(|| crate::Error::Other(format!("Unknown condition: {}", s)))
    }
}

/// The conditions one user holds at one point in time.
///
/// Iteration always follows canonical [`Condition`] order, so two sets with the
/// same members iterate identically regardless of how they were built.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: BTreeSet<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from storage keys, ignoring unknown ones
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for key in keys {
            match Condition::from_key(key.as_ref()) {
                Some(condition) => {
                    set.insert(condition);
                }
                None => tracing::debug!("Ignoring unknown condition key '{}'", key.as_ref()),
            }
        }
        set
    }

    /// Returns true if the condition was newly added
    pub fn insert(&mut self, condition: Condition) -> bool {
        self.conditions.insert(condition)
    }

    pub fn contains(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.conditions.iter().copied()
    }

    /// Storage keys in canonical order
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|c| c.key().to_string()).collect()
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = Condition>>(iter: T) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Catalog and Recommendation Types
// ============================================================================

/// One catalog exercise, tied to the condition it addresses
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseEntry {
    pub condition: Condition,
    pub name: String,
    pub benefits: String,
    pub instructions: String,
    pub image_url: String,
    pub video_url: String,
}

/// A catalog entry produced for a specific condition during one resolution
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Recommendation {
    pub entry: ExerciseEntry,
    pub for_condition: Condition,
}

impl Recommendation {
    /// Condition label as shown next to the recommendation (e.g. "back pain")
    pub fn condition_label(&self) -> String {
        self.for_condition.display_key()
    }

    /// Metadata for practicing this recommendation, categorised by its condition
    pub fn to_exercise(&self) -> ExerciseMetadata {
        ExerciseMetadata {
            name: self.entry.name.clone(),
            category: self.condition_label(),
            instructions: Some(self.entry.instructions.clone()),
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Category used when an exercise carries no condition context
pub const DEFAULT_CATEGORY: &str = "general";

/// What the practice controller needs to know about the chosen exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseMetadata {
    pub name: String,
    pub category: String,
    pub instructions: Option<String>,
}

impl ExerciseMetadata {
    /// Exercise with the default "general" category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: DEFAULT_CATEGORY.to_string(),
            instructions: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl From<&ExerciseEntry> for ExerciseMetadata {
    fn from(entry: &ExerciseEntry) -> Self {
        Self {
            name: entry.name.clone(),
            category: DEFAULT_CATEGORY.to_string(),
            instructions: Some(entry.instructions.clone()),
        }
    }
}

/// Completion fact for one naturally finished practice session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub exercise_name: String,
    pub duration_seconds: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    pub category: String,
}
