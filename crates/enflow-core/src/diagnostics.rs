//! Diagnostics collected while assembling an energy system or building a model.
//!
//! Not every irregularity is fatal. A storage overwriting a user-provided
//! nominal value, or a grouping predicate returning a key nobody registered a
//! constraint block for, lets construction continue. Such events are recorded
//! here as structured [`DiagnosticIssue`]s so callers can inspect them after
//! the fact instead of scraping log output.
//!
//! # Example
//!
//! ```
//! use enflow_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("storage", "nominal value overwritten", "battery");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.issues_by_category("storage").count(), 1);
//! ```

use serde::Serialize;

/// Category for storage-derived attribute overwrites
pub const CATEGORY_STORAGE: &str = "storage";
/// Category for grouping and block dispatch
pub const CATEGORY_GROUPING: &str = "grouping";
/// Category for bound and attribute consistency
pub const CATEGORY_BOUNDS: &str = "bounds";

/// A single recoverable irregularity
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    /// Category for grouping (e.g., "storage", "grouping", "bounds")
    pub category: String,
    pub message: String,
    /// Optional entity reference (component label, flow key or group key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    /// Attach the label of the affected component or flow
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

/// Warnings recorded during construction
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len()
    }

    /// Get issues filtered by category
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter()
    }
}
