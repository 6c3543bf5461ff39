//! Result envelope returned by every lifecycle operation.

use serde::Serialize;

use crate::error::ErrorKind;

/// Success or classified failure of one lifecycle operation.
///
/// Failures are data, not `Err`: callers inspect
/// [`succeeded`](Self::succeeded) and [`error_kind`](Self::error_kind).
///
/// # Example
///
/// ```
/// use trellis_plugins::{ErrorKind, OperationOutcome};
///
/// let outcome = OperationOutcome::failure(ErrorKind::NotFound, "plugin 'x' not found");
/// assert!(!outcome.succeeded);
/// assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// Whether the operation achieved its goal.
    #[serde(rename = "success")]
    pub succeeded: bool,
    /// Operator-facing summary.
    pub message: String,
    /// Failure classification; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Raw diagnostic text from the failing step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Directory the operation settled on (install only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,
    /// Dependencies should be (re)installed (install and update).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_dependency_install: Option<bool>,
}

impl OperationOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            error_kind: None,
            details: None,
            directory_name: None,
            needs_dependency_install: None,
        }
    }

    /// A failed outcome of the given kind.
    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_kind: Some(kind),
            ..Self::success(message)
        }
    }

    /// Attaches diagnostic text; blank text is dropped.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.details = (!details.trim().is_empty()).then_some(details);
        self
    }

    /// Records the directory the operation settled on.
    #[must_use]
    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.directory_name = Some(name.into());
        self
    }

    /// Records whether dependency installation is needed.
    #[must_use]
    pub const fn with_dependency_install(mut self, needed: bool) -> Self {
        self.needs_dependency_install = Some(needed);
        self
    }
}
