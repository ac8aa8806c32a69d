//! Caller account resolution
//!
//! Every ARN embeds the account number, so the account is resolved once from
//! the caller identity and cached. Concurrent first callers share a single
//! in-flight resolution. A failed resolution leaves the cache empty and the
//! next caller retries; a cached account is never re-resolved.

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::{
    backend::MessagingBackend,
    error::{MessagingError, MessagingResult},
    types::AccountId,
};

/// Index of the account segment in a colon-delimited identity ARN
const ACCOUNT_SEGMENT: usize = 4;

/// Lazily resolved, permanently cached account id
#[derive(Debug, Default)]
pub struct IdentityResolver {
    account: OnceCell<AccountId>,
}

impl IdentityResolver {
    /// Creates an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached account without contacting the backend
    #[must_use]
    pub fn cached(&self) -> Option<&AccountId> {
        self.account.get()
    }

    /// Resolves the account, hitting the backend at most once per success
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Backend` if the identity call fails and
    /// `MessagingError::MalformedIdentity` if the returned ARN has no account
    /// segment. Both leave the cache empty.
    pub async fn resolve(&self, backend: &dyn MessagingBackend) -> MessagingResult<AccountId> {
        if let Some(account) = self.account.get() {
            debug!(account_id = %account, "Using cached account id");
            return Ok(account.clone());
        }

        let account = self
            .account
            .get_or_try_init(|| async move {
                let descriptor = backend.caller_identity_arn().await.inspect_err(|e| {
                    error!("Failed to fetch caller identity: {}", e);
                })?;

                let account = account_from_identity_arn(&descriptor)?;
                info!(account_id = %account, "Resolved caller account");
                Ok::<_, MessagingError>(account)
            })
            .await?;

        Ok(account.clone())
    }
}

/// Extracts the account number from a caller identity ARN
///
/// `arn:aws:iam::123456789012:user/alice` yields `123456789012`.
///
/// # Errors
///
/// Returns `MessagingError::MalformedIdentity` if the ARN has fewer than five
/// colon-delimited fields or the account field is empty.
pub fn account_from_identity_arn(descriptor: &str) -> MessagingResult<AccountId> {
    match descriptor.split(':').nth(ACCOUNT_SEGMENT) {
        Some(account) if !account.is_empty() => Ok(AccountId::from(account)),
        _ => Err(MessagingError::MalformedIdentity {
            descriptor: descriptor.to_string(),
        }),
    }
}
