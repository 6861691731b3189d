#![forbid(unsafe_code)]

//! Core domain model and business logic for guided yoga practice.
//!
//! This crate provides:
//! - Domain types (conditions, exercises, recommendations, session records)
//! - Exercise catalog
//! - Recommendation resolver
//! - Practice session controller
//! - Persistence (assessments, WAL, CSV rollup, history)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod resolver;
pub mod session;
pub mod assessment;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, PersistenceWarning, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog};
pub use config::Config;
pub use resolver::resolve;
pub use session::{format_clock, Completion, PracticeSession, SessionState, TickOutcome, TickToken};
pub use assessment::{AssessmentStore, JsonAssessmentStore};
pub use wal::{JsonlSink, SessionSink};
pub use history::{load_recent_records, PracticeSummary};
