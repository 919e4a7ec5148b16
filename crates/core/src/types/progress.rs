//! Progress values and normalization.
//!
//! The backend reports module progress in two shapes: a fraction in `(0, 1]`
//! (older enrollment rows) or a percentage on the 0-100 scale. [`normalize`]
//! folds both into a canonical percentage with at most two decimal places,
//! which every view uses.

use serde::{Deserialize, Serialize};

/// Completion status tag attached to an enrollment.
///
/// Status and numeric progress may disagree; [`module_progress`] reconciles
/// them deterministically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModuleStatus {
    /// No chapter of the module has been opened.
    #[serde(rename = "Not Started")]
    NotStarted,
    /// At least one chapter has been opened.
    #[serde(rename = "In Progress")]
    InProgress,
    /// The backend marked the module complete.
    Completed,
}

/// Progress data for one module, as fetched from the backend.
///
/// All fields are optional; absent values default to "no progress".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleProgress {
    /// Completion status tag, when the backend stored one.
    #[serde(default)]
    pub status: Option<ModuleStatus>,
    /// Raw per-module progress number (fraction or percentage).
    #[serde(default)]
    pub progress: Option<f64>,
    /// Aggregate progress number, preferred over `progress` when present.
    #[serde(default)]
    pub overall_progress: Option<f64>,
}

/// Aggregate statistics over a set of modules.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressStats {
    /// Number of modules considered.
    pub total_modules: usize,
    /// Modules whose status is `Completed`.
    pub completed_modules: usize,
    /// Modules whose status is `In Progress`.
    pub in_progress_modules: usize,
    /// Modules with status `Not Started` or no progress record at all.
    pub not_started_modules: usize,
    /// Mean of [`module_progress`] over all modules.
    pub average_progress: f64,
}

/// Normalize a raw progress number to the 0-100 scale, two decimal places.
///
/// - `None`, zero, and negative or non-finite values map to `0`.
/// - Values in `(0, 1]` are treated as fractions and scaled by 100.
/// - Values above `1` are treated as percentages and pass through, including
///   values above 100 (no clamping).
///
/// A raw value of exactly `1` is indistinguishable from a fraction of 1.0
/// and reads as 100%; a genuine "1%" cannot be represented. This matches the
/// backend's historical convention and is pinned by tests - do not change
/// the threshold without a data migration.
#[must_use]
pub fn normalize(raw: Option<f64>) -> f64 {
    let Some(value) = raw else { return 0.0 };
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    if value <= 1.0 {
        round2(value * 100.0)
    } else {
        round2(value)
    }
}

/// Canonical progress percentage for one module.
///
/// Prefers `overall_progress` over `progress`, normalizes, then reconciles
/// with the status tag: a module flagged `Completed` reports 100 only when
/// the normalized number already reached 100. A completed module with a
/// stale partial number reports the actual number, never a clamped-up 100.
#[must_use]
pub fn module_progress(module: &ModuleProgress) -> f64 {
    let value = normalize(module.overall_progress.or(module.progress));
    if module.status == Some(ModuleStatus::Completed) && value >= 100.0 {
        return 100.0;
    }
    value
}

/// Mean of [`module_progress`] over all modules, two decimal places.
///
/// Returns `0` for an empty slice.
#[must_use]
pub fn average_progress(modules: &[ModuleProgress]) -> f64 {
    if modules.is_empty() {
        return 0.0;
    }
    let sum: f64 = modules.iter().map(module_progress).sum();
    #[allow(clippy::cast_precision_loss)] // module counts stay far below f64 precision
    let count = modules.len() as f64;
    round2(sum / count)
}

/// Aggregate statistics for a set of modules.
///
/// Counts are derived from each module's status tag directly, not from the
/// numeric progress; a missing status counts as not-started.
#[must_use]
pub fn progress_stats(modules: &[ModuleProgress]) -> ProgressStats {
    let mut completed = 0;
    let mut in_progress = 0;
    let mut not_started = 0;
    for module in modules {
        match module.status {
            Some(ModuleStatus::Completed) => completed += 1,
            Some(ModuleStatus::InProgress) => in_progress += 1,
            Some(ModuleStatus::NotStarted) | None => not_started += 1,
        }
    }
    ProgressStats {
        total_modules: modules.len(),
        completed_modules: completed,
        in_progress_modules: in_progress,
        not_started_modules: not_started,
        average_progress: average_progress(modules),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
