use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::claims::VerifiedClaims;
use crate::client::JwtClient;
use crate::clock::{Clock, SystemClock};
use crate::config::JwtSettings;
use crate::error::{JwtError, JwtResult};
use crate::keys::{Algorithm, KeyMaterial, SigningKey, TokenHeader, VerificationKey};
use crate::resolver::KeyResolver;

/// Default client backed by the `jsonwebtoken` crate.
///
/// Signature checks are delegated to `jsonwebtoken`; timestamp checks use the
/// injected [`Clock`] so that life and leeway can be exercised without waiting.
#[derive(Debug, Clone)]
pub struct JsonWebTokenClient {
    clock: Arc<dyn Clock>,
}

impl Default for JsonWebTokenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWebTokenClient {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn stamp(&self, claims: &Map<String, Value>, settings: &JwtSettings) -> JwtResult<Map<String, Value>> {
        let now = self.clock.timestamp();
        let latest_exp = now.saturating_add(i64::try_from(settings.life_seconds).unwrap_or(i64::MAX));

        let mut claims = claims.clone();
        numeric_date(&claims, "nbf")?;
        let iat = numeric_date(&claims, "iat")?.unwrap_or(now);
        claims.insert("iat".to_string(), Value::from(iat));

        let exp = numeric_date(&claims, "exp")?.map_or(latest_exp, |exp| exp.min(latest_exp));
        claims.insert("exp".to_string(), Value::from(exp));

        claims
            .entry("jti")
            .or_insert_with(|| Value::from(Uuid::new_v4().to_string()));
        Ok(claims)
    }

    fn check_timestamps(&self, claims: &VerifiedClaims, settings: &JwtSettings) -> JwtResult<()> {
        let now = self.clock.timestamp();
        let leeway = i64::try_from(settings.leeway_seconds).unwrap_or(i64::MAX);

        if now > claims.expires_at.timestamp().saturating_add(leeway) {
            return Err(JwtError::Expired);
        }
        if let Some(not_before) = claims.not_before {
            if now.saturating_add(leeway) < not_before.timestamp() {
                return Err(JwtError::NotYetValid);
            }
        }
        if let Some(issued_at) = claims.issued_at {
            if now.saturating_add(leeway) < issued_at.timestamp() {
                return Err(JwtError::IssuedInFuture);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JwtClient for JsonWebTokenClient {
    fn name(&self) -> &'static str {
        "jsonwebtoken"
    }

    fn sign(
        &self,
        claims: &Map<String, Value>,
        key: &SigningKey,
        settings: &JwtSettings,
    ) -> JwtResult<String> {
        let claims = self.stamp(claims, settings)?;

        let mut header = Header::new(key.algorithm.into());
        header.kid = key.kid.clone();
        header.jku = key.jku.clone();

        let encoding = encoding_key(&key.material)?;
        let token =
            encode(&header, &claims, &encoding).map_err(|err| JwtError::Signing(err.to_string()))?;
        debug!(kid = ?key.kid, alg = %key.algorithm, "issued JWT");
        Ok(token)
    }

    async fn verify(
        &self,
        token: &str,
        resolver: &dyn KeyResolver,
        settings: &JwtSettings,
    ) -> JwtResult<VerifiedClaims> {
        let header = self.decode_header(token)?;

        if header.jku.is_some() && !settings.allow_jku_header {
            warn!(kid = ?header.kid, "rejecting JWT with jku header");
            return Err(JwtError::DisallowedHeader("jku"));
        }
        if !settings.allows(header.alg) {
            warn!(alg = %header.alg, "rejecting JWT with disallowed algorithm");
            return Err(JwtError::UnsupportedAlgorithm(header.alg.to_string()));
        }

        let key = resolver.resolve(&header, settings).await?;
        let decoding = decoding_key(&key)?;

        // Time-based claims are checked against our own clock below.
        let mut validation = Validation::new(header.alg.into());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let token_data = decode::<Value>(token, &decoding, &validation)?;
        let claims = VerifiedClaims::try_from(token_data.claims)?;
        self.check_timestamps(&claims, settings)?;

        debug!(kid = ?header.kid, "verified JWT successfully");
        Ok(claims)
    }

    fn decode_header(&self, token: &str) -> JwtResult<TokenHeader> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|err| JwtError::Malformed(format!("header: {err}")))?;
        Ok(TokenHeader {
            alg: header.alg.into(),
            typ: header.typ,
            kid: header.kid,
            jku: header.jku,
        })
    }
}

/// Integer seconds in `name`, `None` when the claim is absent or `null`.
fn numeric_date(claims: &Map<String, Value>, name: &'static str) -> JwtResult<Option<i64>> {
    match claims.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| JwtError::InvalidClaim(name, value.to_string())),
    }
}

fn encoding_key(material: &KeyMaterial) -> JwtResult<EncodingKey> {
    let key = match material {
        KeyMaterial::Secret(secret) => EncodingKey::from_secret(secret),
        KeyMaterial::RsaPem(pem) => EncodingKey::from_rsa_pem(pem)?,
        KeyMaterial::EcPem(pem) => EncodingKey::from_ec_pem(pem)?,
        KeyMaterial::EdPem(pem) => EncodingKey::from_ed_pem(pem)?,
        KeyMaterial::RsaComponents { .. } => {
            return Err(JwtError::KeyParse(
                "RSA public components cannot sign tokens".to_string(),
            ))
        }
    };
    Ok(key)
}

fn decoding_key(key: &VerificationKey) -> JwtResult<DecodingKey> {
    let key = match &key.material {
        KeyMaterial::Secret(secret) => DecodingKey::from_secret(secret),
        KeyMaterial::RsaPem(pem) => DecodingKey::from_rsa_pem(pem)?,
        KeyMaterial::EcPem(pem) => DecodingKey::from_ec_pem(pem)?,
        KeyMaterial::EdPem(pem) => DecodingKey::from_ed_pem(pem)?,
        KeyMaterial::RsaComponents { n, e } => DecodingKey::from_rsa_components(n, e)?,
    };
    Ok(key)
}

impl From<Algorithm> for jsonwebtoken::Algorithm {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::HS256 => Self::HS256,
            Algorithm::HS384 => Self::HS384,
            Algorithm::HS512 => Self::HS512,
            Algorithm::ES256 => Self::ES256,
            Algorithm::ES384 => Self::ES384,
            Algorithm::RS256 => Self::RS256,
            Algorithm::RS384 => Self::RS384,
            Algorithm::RS512 => Self::RS512,
            Algorithm::PS256 => Self::PS256,
            Algorithm::PS384 => Self::PS384,
            Algorithm::PS512 => Self::PS512,
            Algorithm::EdDSA => Self::EdDSA,
        }
    }
}

impl From<jsonwebtoken::Algorithm> for Algorithm {
    fn from(value: jsonwebtoken::Algorithm) -> Self {
        match value {
            jsonwebtoken::Algorithm::HS256 => Self::HS256,
            jsonwebtoken::Algorithm::HS384 => Self::HS384,
            jsonwebtoken::Algorithm::HS512 => Self::HS512,
            jsonwebtoken::Algorithm::ES256 => Self::ES256,
            jsonwebtoken::Algorithm::ES384 => Self::ES384,
            jsonwebtoken::Algorithm::RS256 => Self::RS256,
            jsonwebtoken::Algorithm::RS384 => Self::RS384,
            jsonwebtoken::Algorithm::RS512 => Self::RS512,
            jsonwebtoken::Algorithm::PS256 => Self::PS256,
            jsonwebtoken::Algorithm::PS384 => Self::PS384,
            jsonwebtoken::Algorithm::PS512 => Self::PS512,
            jsonwebtoken::Algorithm::EdDSA => Self::EdDSA,
        }
    }
}
