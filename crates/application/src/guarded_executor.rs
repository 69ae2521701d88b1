//! Authentication, throttling and failure reporting around sensitive actions.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use fundgate_core::{AppResult, AuthenticatedSubject};
use fundgate_domain::{FailureKind, RateLimitKey};

use crate::guard_ports::{IdentityProvider, Notifier};
use crate::rate_limit_service::WindowLimiter;

/// Reason a guarded operation produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct GuardFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Message delivered to the notifier.
    pub message: String,
}

/// Runs caller-supplied operations behind authentication and rate limiting.
///
/// Failures never propagate as errors from [`GuardedExecutor::execute`]; they
/// are reported through the [`Notifier`] and collapsed to `None`.
#[derive(Clone)]
pub struct GuardedExecutor {
    identity_provider: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    limiter: Option<WindowLimiter>,
    in_flight: Arc<AtomicBool>,
}

impl GuardedExecutor {
    /// Creates an executor without rate limiting.
    #[must_use]
    pub fn new(identity_provider: Arc<dyn IdentityProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            identity_provider,
            notifier,
            limiter: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Consults `limiter` with the `(subject, operation)` key before each operation.
    #[must_use]
    pub fn with_limiter(mut self, limiter: WindowLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Returns whether an operation is currently running.
    ///
    /// Meant for disabling submit actions; it does not prevent overlapping calls.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs `operation` and returns its result, or `None` after reporting a failure.
    pub async fn execute<T, F, Fut>(&self, operation_name: &str, operation: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.execute_detailed(operation_name, operation).await.ok()
    }

    /// Runs `operation` like [`GuardedExecutor::execute`] but keeps the failure category.
    pub async fn execute_detailed<T, F, Fut>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, GuardFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let _in_flight = InFlightGuard::engage(self.in_flight.as_ref());
        let invocation_id = Uuid::new_v4();

        let subject = match self.identity_provider.verify_authentication().await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                return Err(self.report(
                    invocation_id,
                    operation_name,
                    FailureKind::NotAuthenticated,
                    "no authenticated subject",
                ));
            }
            Err(error) => {
                return Err(self.report(
                    invocation_id,
                    operation_name,
                    FailureKind::NotAuthenticated,
                    error.to_string().as_str(),
                ));
            }
        };

        if let Some(failure) = self
            .enforce_rate_limit(invocation_id, &subject, operation_name)
            .await
        {
            return Err(failure);
        }

        match operation().await {
            Ok(value) => {
                debug!(
                    invocation_id = %invocation_id,
                    operation = %operation_name,
                    subject = %subject.subject(),
                    "guarded operation succeeded"
                );
                Ok(value)
            }
            Err(error) => Err(self.report(
                invocation_id,
                operation_name,
                FailureKind::classify(&error),
                error.detail(),
            )),
        }
    }

    async fn enforce_rate_limit(
        &self,
        invocation_id: Uuid,
        subject: &AuthenticatedSubject,
        operation_name: &str,
    ) -> Option<GuardFailure> {
        let limiter = self.limiter.as_ref()?;
        let key = match RateLimitKey::new(subject.subject(), operation_name) {
            Ok(key) => key,
            Err(error) => {
                return Some(self.report(
                    invocation_id,
                    operation_name,
                    FailureKind::ValidationFailed,
                    error.detail(),
                ));
            }
        };

        match limiter.check(&key).await {
            Ok(true) => Some(self.report(
                invocation_id,
                operation_name,
                FailureKind::RateLimited,
                format!("rate limit '{}' exceeded", limiter.policy().name()).as_str(),
            )),
            Ok(false) => None,
            // Limiter storage trouble lets the operation through.
            Err(error) => {
                warn!(
                    invocation_id = %invocation_id,
                    operation = %operation_name,
                    limiter = %limiter.policy().name(),
                    error = %error,
                    "rate limit check failed"
                );
                None
            }
        }
    }

    fn report(
        &self,
        invocation_id: Uuid,
        operation_name: &str,
        kind: FailureKind,
        detail: &str,
    ) -> GuardFailure {
        warn!(
            invocation_id = %invocation_id,
            operation = %operation_name,
            kind = kind.as_str(),
            detail = %detail,
            "guarded operation failed"
        );

        let message = kind.user_message(detail);
        self.notifier.notify(message.as_str(), kind.severity());
        GuardFailure { kind, message }
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
