use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error};

use crate::client::JwtClient;
use crate::error::JwtResult;
use crate::jsonwebtoken_client::JsonWebTokenClient;

type ClientFactory = Box<dyn Fn() -> JwtResult<Arc<dyn JwtClient>> + Send + Sync>;

/// Holds the active [`JwtClient`], creating one from the factory on first use.
pub struct JwtClientRegistry {
    active: RwLock<Option<Arc<dyn JwtClient>>>,
    factory: ClientFactory,
}

impl JwtClientRegistry {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> JwtResult<Arc<dyn JwtClient>> + Send + Sync + 'static,
    {
        Self {
            active: RwLock::new(None),
            factory: Box::new(factory),
        }
    }

    /// Registry whose default is the `jsonwebtoken` backed client.
    pub fn with_default_client() -> Self {
        Self::new(|| {
            let client: Arc<dyn JwtClient> = Arc::new(JsonWebTokenClient::new());
            Ok(client)
        })
    }

    /// Replace the active client. `None` restores the factory default on next use.
    pub fn set_client(&self, client: Option<Arc<dyn JwtClient>>) {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = &client {
            debug!(client = client.name(), "installed JWT client");
        }
        *guard = client;
    }

    /// The active client. Repeated calls return the same instance until
    /// [`set_client`](Self::set_client) is called.
    pub fn client(&self) -> JwtResult<Arc<dyn JwtClient>> {
        {
            let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(client) = guard.as_ref() {
                return Ok(Arc::clone(client));
            }
        }

        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)().map_err(|err| {
            error!(error = %err, "failed to create default JWT client");
            err
        })?;
        debug!(client = client.name(), "created default JWT client");
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    pub fn is_configured(&self) -> bool {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        guard.is_some()
    }
}

impl Default for JwtClientRegistry {
    fn default() -> Self {
        Self::with_default_client()
    }
}

impl fmt::Debug for JwtClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("JwtClientRegistry")
            .field("active", &guard.as_ref().map(|client| client.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::VerifiedClaims;
    use crate::config::JwtSettings;
    use crate::error::JwtError;
    use crate::keys::{SigningKey, TokenHeader};
    use crate::resolver::KeyResolver;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct StubClient;

    #[async_trait]
    impl JwtClient for StubClient {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn sign(
            &self,
            _claims: &Map<String, Value>,
            _key: &SigningKey,
            _settings: &JwtSettings,
        ) -> JwtResult<String> {
            Ok("stub.token.value".to_string())
        }

        async fn verify(
            &self,
            _token: &str,
            _resolver: &dyn KeyResolver,
            _settings: &JwtSettings,
        ) -> JwtResult<VerifiedClaims> {
            Err(JwtError::InvalidSignature)
        }

        fn decode_header(&self, token: &str) -> JwtResult<TokenHeader> {
            Err(JwtError::Malformed(token.to_string()))
        }
    }

    fn stub() -> Arc<dyn JwtClient> {
        Arc::new(StubClient)
    }

    #[test]
    fn default_client_is_created_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = JwtClientRegistry::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(stub())
        });

        assert!(!registry.is_configured());
        let first = registry.client().expect("client");
        let second = registry.client().expect("client");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_configured());
    }

    #[test]
    fn set_client_replaces_active_client() {
        let registry = JwtClientRegistry::with_default_client();
        assert_eq!(registry.client().expect("default").name(), "jsonwebtoken");

        let replacement = stub();
        registry.set_client(Some(Arc::clone(&replacement)));
        let active = registry.client().expect("client");
        assert!(Arc::ptr_eq(&active, &replacement));
    }

    #[test]
    fn clearing_restores_factory_default() {
        let registry = JwtClientRegistry::with_default_client();
        registry.set_client(Some(stub()));
        registry.set_client(None);
        assert!(!registry.is_configured());
        assert_eq!(registry.client().expect("default").name(), "jsonwebtoken");
    }

    #[test]
    fn factory_failure_surfaces_immediately() {
        let registry = JwtClientRegistry::new(|| {
            Err(JwtError::ClientUnavailable("backend not linked".to_string()))
        });
        let err = registry.client().expect_err("no backend");
        assert!(matches!(err, JwtError::ClientUnavailable(_)));
        assert!(!registry.is_configured());
    }

    #[test]
    fn concurrent_first_reads_share_one_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = Arc::new(JwtClientRegistry::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(stub())
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.client().expect("client"))
            })
            .collect();
        let clients: Vec<Arc<dyn JwtClient>> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clients.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
