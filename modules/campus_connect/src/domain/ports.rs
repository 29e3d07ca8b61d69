use async_trait::async_trait;

/// One-way password hashing. Implementations keep the CPU work off the
/// async executor.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, password: &str) -> anyhow::Result<String>;
    /// Ok(false) for a wrong password; Err only for an unreadable hash.
    async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}
