//! Key-value document store contract.

use crate::domain::Document;
use anyhow::Result;
use async_trait::async_trait;

/// Asynchronous key-value storage for whole documents.
///
/// Writes are last-write-wins; no transactional guarantees beyond that.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Document>>;

    async fn set(&self, key: &str, document: &Document) -> Result<()>;

    /// Stored keys in sorted order.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Keys double as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        anyhow::bail!("document key must not be empty");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!(
            "document key '{}' may only contain letters, digits, '-' and '_'",
            key
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("launch-deck_2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("with space").is_err());
    }
}
