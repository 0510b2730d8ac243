use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::config::JwtSettings;
use crate::error::{JwtError, JwtResult};
use crate::keys::{TokenHeader, VerificationKey};

/// Strategy for finding the key that should verify a token.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(
        &self,
        header: &TokenHeader,
        settings: &JwtSettings,
    ) -> JwtResult<VerificationKey>;
}

/// A single trusted key verifies every token.
#[async_trait]
impl KeyResolver for VerificationKey {
    async fn resolve(
        &self,
        _header: &TokenHeader,
        _settings: &JwtSettings,
    ) -> JwtResult<VerificationKey> {
        Ok(self.clone())
    }
}

/// Thread-safe store of verification keys indexed by `kid`.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<HashMap<String, VerificationKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: VerificationKey) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<VerificationKey> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, VerificationKey)>,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        guard.extend(entries);
    }
}

#[async_trait]
impl KeyResolver for KeyStore {
    async fn resolve(
        &self,
        header: &TokenHeader,
        _settings: &JwtSettings,
    ) -> JwtResult<VerificationKey> {
        let kid = header.kid.as_deref().ok_or(JwtError::MissingKeyId)?;
        self.get(kid)
            .ok_or_else(|| JwtError::UnknownKeyId(kid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Algorithm;

    fn header(kid: Option<&str>) -> TokenHeader {
        TokenHeader {
            alg: Algorithm::RS256,
            typ: Some("JWT".to_string()),
            kid: kid.map(str::to_string),
            jku: None,
        }
    }

    #[test]
    fn key_store_insert_replace_round_trip() {
        let store = KeyStore::new();
        assert!(!store.contains("kid"));
        store.insert_key("kid", VerificationKey::secret(b"secret".to_vec()));
        assert!(store.contains("kid"));
        assert!(store.get("kid").is_some());

        store.replace_all(vec![(
            "another".to_string(),
            VerificationKey::secret(b"other".to_vec()),
        )]);
        assert!(!store.contains("kid"));
        assert!(store.contains("another"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn key_store_resolves_by_kid() {
        let store = KeyStore::new();
        let key = VerificationKey::secret(b"secret".to_vec());
        store.insert_key("k1", key.clone());
        let settings = JwtSettings::default();

        let resolved = store.resolve(&header(Some("k1")), &settings).await.expect("known kid");
        assert_eq!(resolved, key);

        let err = store.resolve(&header(Some("k2")), &settings).await.expect_err("unknown kid");
        assert!(matches!(err, JwtError::UnknownKeyId(kid) if kid == "k2"));

        let err = store.resolve(&header(None), &settings).await.expect_err("missing kid");
        assert!(matches!(err, JwtError::MissingKeyId));
    }

    #[tokio::test]
    async fn static_key_ignores_header() {
        let key = VerificationKey::secret(b"secret".to_vec());
        let resolved = key
            .resolve(&header(None), &JwtSettings::default())
            .await
            .expect("static key");
        assert_eq!(resolved, key);
    }
}
