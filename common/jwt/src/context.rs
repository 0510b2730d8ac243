use std::sync::Arc;

use serde_json::{Map, Value};

use crate::claims::VerifiedClaims;
use crate::client::JwtClient;
use crate::config::JwtSettings;
use crate::error::JwtResult;
use crate::keys::{SigningKey, TokenHeader};
use crate::registry::JwtClientRegistry;
use crate::resolver::KeyResolver;

/// Settings and client registry bundled for the request-handling layer.
///
/// Each call looks the active client up again, so a client installed with
/// [`JwtClientRegistry::set_client`] applies to the next operation.
#[derive(Debug, Clone, Default)]
pub struct JwtContext {
    settings: Arc<JwtSettings>,
    registry: Arc<JwtClientRegistry>,
}

impl JwtContext {
    pub fn new(settings: JwtSettings, registry: JwtClientRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    pub fn registry(&self) -> &JwtClientRegistry {
        &self.registry
    }

    pub fn client(&self) -> JwtResult<Arc<dyn JwtClient>> {
        self.registry.client()
    }

    pub fn sign(&self, claims: &Map<String, Value>, key: &SigningKey) -> JwtResult<String> {
        self.client()?.sign(claims, key, &self.settings)
    }

    pub async fn verify(&self, token: &str, resolver: &dyn KeyResolver) -> JwtResult<VerifiedClaims> {
        let client = self.client()?;
        client.verify(token, resolver, &self.settings).await
    }

    pub fn decode_header(&self, token: &str) -> JwtResult<TokenHeader> {
        self.client()?.decode_header(token)
    }
}
