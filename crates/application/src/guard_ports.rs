use async_trait::async_trait;

use fundgate_core::{AppResult, AuthenticatedSubject};
use fundgate_domain::Severity;

/// Identity collaborator port.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the subject of the current session.
    ///
    /// Both an error and `Ok(None)` mean the caller is not authenticated.
    async fn verify_authentication(&self) -> AppResult<Option<AuthenticatedSubject>>;
}

/// Fire-and-forget channel for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Surfaces `message` to the user.
    fn notify(&self, message: &str, severity: Severity);
}
