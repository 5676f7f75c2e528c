//! Quality report value types.
//!
//! Reports are plain values: validation rules each build their own report and
//! callers merge them, so individual rules stay unit-testable without shared
//! mutable collectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which entity collection an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Recipe,
    Category,
    Website,
    MenuItem,
    /// Dataset-level findings that do not belong to a single entity.
    General,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Recipe => "recipe",
            EntityKind::Category => "category",
            EntityKind::Website => "website",
            EntityKind::MenuItem => "menuItem",
            EntityKind::General => "general",
        }
    }
}

/// A single structural or referential defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub category: EntityKind,
    /// Entity id, or "general" for dataset-level issues.
    pub item: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationIssue {
    pub fn new(category: EntityKind, item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category,
            item: item.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// The validator's verdict on a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub metrics: BTreeMap<String, Value>,
    pub quality_score: f64,
    pub passed: bool,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(mut self, issue: ValidationIssue) -> Self {
        self.errors.push(issue);
        self
    }

    pub fn warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// Combine two partial reports. Metrics from `other` win on key clashes.
    pub fn merge(mut self, other: QualityReport) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.metrics.extend(other.metrics);
        self
    }

    /// Compute the score and pass/fail verdict against the dataset size.
    ///
    /// `qualityScore = max(0, 100 - issues/totalItems * 100)`; an empty
    /// dataset scores 100.
    pub fn finalize(mut self, total_items: usize) -> Self {
        let issues = self.errors.len() + self.warnings.len();
        self.quality_score = if total_items == 0 {
            100.0
        } else {
            (100.0 - (issues as f64 / total_items as f64) * 100.0).max(0.0)
        };
        self.passed = self.errors.is_empty();
        self
    }

    pub fn count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}
