//! Origin Retrievers
//!
//! The seam to the authoritative data source consulted on a full miss.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;

use crate::error::{CacheError, Result};

// == Retriever ==
/// Loads a value from the origin.
///
/// Implementations return [`CacheError::NotFound`] when the origin confirms
/// the key is absent; any other error is treated as an origin failure.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>>;
}

// == Retrieve Fn ==
/// Adapts an async closure into a [`Retriever`].
///
/// ```ignore
/// let origin = RetrieveFn::new(|key: String| async move {
///     db.lookup(&key).await
/// });
/// ```
pub struct RetrieveFn<F> {
    f: F,
}

impl<F> RetrieveFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Retriever for RetrieveFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>>> + Send,
{
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>> {
        (self.f)(key.to_string()).await
    }
}

// == Static Retriever ==
/// In-memory origin backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticRetriever {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a flat JSON object. String values are stored verbatim, any
    /// other JSON value as its compact rendering.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| CacheError::InvalidRequest(format!("origin data: {}", e)))?;

        Ok(Self::new(map.into_iter().map(|(key, value)| {
            let bytes = match value {
                serde_json::Value::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            };
            (key, bytes)
        })))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_retriever() {
        let origin = StaticRetriever::new([("alice", "99.5"), ("bob", "87.0")]);

        assert_eq!(origin.retrieve("alice").await.unwrap(), b"99.5");
        assert!(origin.retrieve("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_static_retriever_from_json() {
        let origin = StaticRetriever::from_json(r#"{"alice": "99.5", "bob": 87}"#).unwrap();

        assert_eq!(origin.len(), 2);
        assert_eq!(origin.retrieve("alice").await.unwrap(), b"99.5");
        assert_eq!(origin.retrieve("bob").await.unwrap(), b"87");
    }

    #[test]
    fn test_static_retriever_rejects_bad_json() {
        assert!(matches!(
            StaticRetriever::from_json("[1, 2]"),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_fn() {
        let origin = RetrieveFn::new(|key: String| async move {
            if key == "alice" {
                Ok(b"99.5".to_vec())
            } else {
                Err(CacheError::Origin("connection refused".to_string()))
            }
        });

        assert_eq!(origin.retrieve("alice").await.unwrap(), b"99.5");
        assert!(matches!(
            origin.retrieve("bob").await,
            Err(CacheError::Origin(_))
        ));
    }
}
