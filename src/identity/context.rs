//! Enrolled identity resolution and caching.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::OnceCell;

use crate::error::{FabricError, FabricResult};
use crate::ledger::types::{CreateUserRequest, Identity};
use crate::ledger::LedgerSdk;

/// An identity that was checked to be enrolled.
///
/// Only [`IdentityContext`] constructs these, so holding one proves the
/// enrollment check ran before any transaction id was minted.
#[derive(Debug, Clone)]
pub struct EnrolledIdentity(Arc<Identity>);

impl EnrolledIdentity {
    fn check(identity: Arc<Identity>) -> Option<Self> {
        identity.is_enrolled().then_some(Self(identity))
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl Deref for EnrolledIdentity {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

/// Resolves the configured user against the credential store.
pub struct IdentityContext {
    sdk: Arc<dyn LedgerSdk>,
    username: String,
    msp_id: String,
    store_path: PathBuf,
    /// Set once the state store and crypto suite are bound.
    store_ready: OnceCell<()>,
    cached: ArcSwapOption<Identity>,
}

impl IdentityContext {
    pub fn new(
        sdk: Arc<dyn LedgerSdk>,
        username: impl Into<String>,
        msp_id: impl Into<String>,
        store_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sdk,
            username: username.into(),
            msp_id: msp_id.into(),
            store_path: store_path.into(),
            store_ready: OnceCell::new(),
            cached: ArcSwapOption::empty(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    async fn ensure_store(&self) -> FabricResult<()> {
        self.store_ready
            .get_or_try_init(|| async {
                self.sdk.open_credential_store(&self.store_path).await?;
                tracing::info!(store_path = %self.store_path.display(), "Credential store opened");
                Ok::<(), FabricError>(())
            })
            .await?;
        Ok(())
    }

    /// Return the enrolled identity for the configured user.
    ///
    /// Fails with [`FabricError::Enrollment`] when the user is unknown or not
    /// enrolled. No network call is made in either case.
    pub async fn resolve(&self) -> FabricResult<EnrolledIdentity> {
        if let Some(identity) = self.cached.load_full() {
            if let Some(enrolled) = EnrolledIdentity::check(identity) {
                return Ok(enrolled);
            }
        }

        self.ensure_store().await?;

        let identity = self
            .sdk
            .user_context(&self.username)
            .await
            .map_err(|e| FabricError::Enrollment(format!("Failed to load user {}: {}", self.username, e)))?;

        let Some(identity) = identity else {
            tracing::error!(username = %self.username, "User not found in credential store");
            return Err(FabricError::Enrollment(format!(
                "User {} not found in credential store; import an identity first",
                self.username
            )));
        };

        let identity = Arc::new(identity);
        match EnrolledIdentity::check(Arc::clone(&identity)) {
            Some(enrolled) => {
                tracing::debug!(username = %self.username, "Loaded enrolled user from persistence");
                self.cached.store(Some(identity));
                Ok(enrolled)
            }
            None => {
                tracing::error!(username = %self.username, "User is not enrolled");
                Err(FabricError::Enrollment(format!("User {} is not enrolled", self.username)))
            }
        }
    }

    /// Register an identity from a private key and signed certificate.
    ///
    /// Concurrent imports for the same user must be serialized by the caller.
    pub async fn import(&self, private_key_path: &Path, signed_cert_path: &Path) -> FabricResult<Identity> {
        self.ensure_store().await?;

        let request = CreateUserRequest {
            username: self.username.clone(),
            msp_id: self.msp_id.clone(),
            private_key_path: private_key_path.to_path_buf(),
            signed_cert_path: signed_cert_path.to_path_buf(),
        };
        let identity = self.sdk.create_user(&request).await.map_err(|e| {
            FabricError::Enrollment(format!("Failed to import identity for {}: {}", self.username, e))
        })?;

        tracing::info!(username = %identity.username, msp_id = %identity.msp_id, "Identity imported");
        self.cached.store(Some(Arc::new(identity.clone())));
        Ok(identity)
    }

    /// Drop the cached identity so the next resolve reads the store again.
    pub fn forget(&self) {
        self.cached.store(None);
    }
}

impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("username", &self.username)
            .field("msp_id", &self.msp_id)
            .field("store_path", &self.store_path)
            .field("cached", &self.cached.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;

    fn context(mock: &Arc<MockLedger>) -> IdentityContext {
        IdentityContext::new(mock.clone(), "user1", "Org1MSP", "/tmp/hfc-key-store")
    }

    #[tokio::test]
    async fn test_store_opened_once_and_identity_cached() {
        let mock = Arc::new(MockLedger::new());
        let ctx = context(&mock);

        let first = ctx.resolve().await.unwrap();
        let second = ctx.resolve().await.unwrap();
        assert_eq!(first.username(), "user1");
        assert_eq!(second.msp_id, "Org1MSP");
        assert_eq!(mock.count("open_credential_store"), 1);
        assert_eq!(mock.count("user_context"), 1);

        ctx.forget();
        ctx.resolve().await.unwrap();
        assert_eq!(mock.count("open_credential_store"), 1);
        assert_eq!(mock.count("user_context"), 2);
    }

    #[tokio::test]
    async fn test_missing_user() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.identity = None);

        let err = context(&mock).resolve().await.unwrap_err();
        assert!(matches!(err, FabricError::Enrollment(msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_store_failure_is_retried() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.store_error = Some("permission denied".into()));
        let ctx = context(&mock);

        assert!(matches!(ctx.resolve().await, Err(FabricError::Ledger(_))));

        mock.update(|s| s.store_error = None);
        ctx.resolve().await.unwrap();
        assert_eq!(mock.count("open_credential_store"), 2);
    }

    #[tokio::test]
    async fn test_import_uses_configured_msp() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.identity = None);
        let ctx = context(&mock);

        let identity = ctx
            .import(Path::new("keystore/priv_sk"), Path::new("signcerts/cert.pem"))
            .await
            .unwrap();
        assert_eq!(identity.msp_id, "Org1MSP");

        let enrolled = ctx.resolve().await.unwrap();
        assert_eq!(enrolled.username(), "user1");
        assert_eq!(mock.count("user_context"), 0);
    }
}
