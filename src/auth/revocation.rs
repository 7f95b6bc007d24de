//! Token revocation
//!
//! Revocation is keyed on the exact token string. Implementations must be safe to
//! share across concurrent requests.

use axum::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Set of token strings rejected regardless of signature or expiry
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn contains(&self, token: &str) -> bool;

    async fn add(&self, token: &str);
}

/// Process-local revocation set. Entries are never pruned.
#[derive(Clone, Default)]
pub struct InMemoryRevocationStore {
    tokens: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn contains(&self, token: &str) -> bool {
        self.tokens.read().await.contains(token)
    }

    async fn add(&self, token: &str) {
        let inserted = self.tokens.write().await.insert(token.to_string());
        if inserted {
            tracing::debug!("Token added to revocation set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_contains() {
        let store = InMemoryRevocationStore::new();
        assert!(store.is_empty().await);
        assert!(!store.contains("abc").await);

        store.add("abc").await;
        assert!(store.contains("abc").await);
        assert!(!store.contains("abcd").await);
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        store.add("abc").await;
        store.add("abc").await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds() {
        let store = InMemoryRevocationStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add(&format!("token-{}", i)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len().await, 32);
        assert!(store.contains("token-31").await);
    }
}
