use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::claims::VerifiedClaims;
use crate::config::JwtSettings;
use crate::error::JwtResult;
use crate::keys::{SigningKey, TokenHeader};
use crate::resolver::KeyResolver;

/// Capability set every JWT backend provides.
///
/// Callers hold an `Arc<dyn JwtClient>` obtained from the registry and never
/// depend on a concrete backend.
#[async_trait]
pub trait JwtClient: Send + Sync + fmt::Debug {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Issue a signed token. The client stamps `iat`, bounds `exp` by
    /// `settings.life_seconds` and adds a `jti` when missing.
    fn sign(
        &self,
        claims: &Map<String, Value>,
        key: &SigningKey,
        settings: &JwtSettings,
    ) -> JwtResult<String>;

    /// Check signature, header policy and timestamps, returning the claims.
    async fn verify(
        &self,
        token: &str,
        resolver: &dyn KeyResolver,
        settings: &JwtSettings,
    ) -> JwtResult<VerifiedClaims>;

    /// Decode the header without checking the signature.
    fn decode_header(&self, token: &str) -> JwtResult<TokenHeader>;
}
