//! Failure categories for guarded operations and the user-facing wording for each.

use fundgate_core::AppError;
use serde::{Deserialize, Serialize};

const RATE_LIMIT_PATTERNS: &[&str] = &["rate limit", "too many requests"];
const AUTHORIZATION_PATTERNS: &[&str] = &["unauthorized", "forbidden", "permission", "not allowed"];
const VALIDATION_PATTERNS: &[&str] = &["validation", "invalid", "required"];

/// Category of a guarded operation failure, used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No authenticated subject could be resolved.
    NotAuthenticated,
    /// A rate limiter rejected the request.
    RateLimited,
    /// The subject lacks permission for the operation.
    Unauthorized,
    /// The operation rejected its input.
    ValidationFailed,
    /// Anything else; the original message is surfaced verbatim.
    Unclassified,
}

/// Severity attached to user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational notice.
    Info,
    /// Recoverable problem, usually worth retrying later.
    Warning,
    /// Failed action.
    Error,
}

impl FailureKind {
    /// Classifies an operation error.
    ///
    /// Structured variants map directly. Variants that carry free text from
    /// collaborators fall back to case-insensitive substring matching, checked
    /// in order: rate limit wording, then authorization wording, then
    /// validation wording. Errors whose text matches none of these are
    /// `Unclassified`, so an operation that wants a specific category must
    /// either return the matching variant or use the matching wording.
    #[must_use]
    pub fn classify(error: &AppError) -> Self {
        match error {
            AppError::RateLimited(_) => Self::RateLimited,
            AppError::Unauthorized(_) | AppError::Forbidden(_) => Self::Unauthorized,
            AppError::Validation(_) => Self::ValidationFailed,
            AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::Internal(message) => Self::classify_message(message),
        }
    }

    /// Classifies free-form failure text.
    #[must_use]
    pub fn classify_message(message: &str) -> Self {
        let message = message.to_lowercase();
        let matches_any =
            |patterns: &[&str]| patterns.iter().any(|pattern| message.contains(pattern));

        if matches_any(RATE_LIMIT_PATTERNS) {
            Self::RateLimited
        } else if matches_any(AUTHORIZATION_PATTERNS) {
            Self::Unauthorized
        } else if matches_any(VALIDATION_PATTERNS) {
            Self::ValidationFailed
        } else {
            Self::Unclassified
        }
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::ValidationFailed => "validation_failed",
            Self::Unclassified => "unclassified",
        }
    }

    /// Returns the notification severity for this category.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::RateLimited => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Builds the message shown to the user. `detail` is only used by `Unclassified`.
    #[must_use]
    pub fn user_message(&self, detail: &str) -> String {
        match self {
            Self::NotAuthenticated => "You must be signed in to perform this action.".to_owned(),
            Self::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_owned()
            }
            Self::Unauthorized => "You do not have permission to perform this action.".to_owned(),
            Self::ValidationFailed => {
                "Invalid input. Please check your data and try again.".to_owned()
            }
            Self::Unclassified if detail.trim().is_empty() => {
                "Something went wrong. Please try again.".to_owned()
            }
            Self::Unclassified => detail.to_owned(),
        }
    }
}
