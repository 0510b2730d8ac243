use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JwtError;

/// JWS signing algorithms understood by the client interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    ES256,
    ES384,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    EdDSA,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::PS256 => "PS256",
            Algorithm::PS384 => "PS384",
            Algorithm::PS512 => "PS512",
            Algorithm::EdDSA => "EdDSA",
        }
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        )
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = JwtError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let alg = match value {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            "ES256" => Algorithm::ES256,
            "ES384" => Algorithm::ES384,
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            "PS256" => Algorithm::PS256,
            "PS384" => Algorithm::PS384,
            "PS512" => Algorithm::PS512,
            "EdDSA" => Algorithm::EdDSA,
            other => return Err(JwtError::UnsupportedAlgorithm(other.to_string())),
        };
        Ok(alg)
    }
}

/// Token header fields relevant to key selection and policy checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenHeader {
    pub alg: Algorithm,
    pub typ: Option<String>,
    pub kid: Option<String>,
    /// Remote JWK set URL declared by the token.
    pub jku: Option<String>,
}

/// Raw key bytes; secrets never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Secret(Vec<u8>),
    RsaPem(Vec<u8>),
    EcPem(Vec<u8>),
    EdPem(Vec<u8>),
    /// Base64url-encoded RSA modulus and exponent, as found in a JWK.
    RsaComponents { n: String, e: String },
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Secret(_) => f.write_str("Secret(<redacted>)"),
            KeyMaterial::RsaPem(_) => f.write_str("RsaPem(..)"),
            KeyMaterial::EcPem(_) => f.write_str("EcPem(..)"),
            KeyMaterial::EdPem(_) => f.write_str("EdPem(..)"),
            KeyMaterial::RsaComponents { .. } => f.write_str("RsaComponents { .. }"),
        }
    }
}

/// Private key (or shared secret) used to issue tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub algorithm: Algorithm,
    pub kid: Option<String>,
    /// Published as the `jku` header so the receiver can locate the public key.
    pub jku: Option<String>,
    pub material: KeyMaterial,
}

impl SigningKey {
    pub fn new(algorithm: Algorithm, material: KeyMaterial) -> Self {
        Self {
            algorithm,
            kid: None,
            jku: None,
            material,
        }
    }

    pub fn rsa_pem(algorithm: Algorithm, pem: impl Into<Vec<u8>>) -> Self {
        Self::new(algorithm, KeyMaterial::RsaPem(pem.into()))
    }

    pub fn secret(algorithm: Algorithm, secret: impl Into<Vec<u8>>) -> Self {
        Self::new(algorithm, KeyMaterial::Secret(secret.into()))
    }

    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn with_jku(mut self, url: impl Into<String>) -> Self {
        self.jku = Some(url.into());
        self
    }
}

/// Public key (or shared secret) used to check a token's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    pub material: KeyMaterial,
}

impl VerificationKey {
    pub fn new(material: KeyMaterial) -> Self {
        Self { material }
    }

    pub fn rsa_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyMaterial::RsaPem(pem.into()))
    }

    pub fn rsa_components(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self::new(KeyMaterial::RsaComponents {
            n: n.into(),
            e: e.into(),
        })
    }

    pub fn secret(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyMaterial::Secret(secret.into()))
    }
}
