use thiserror::Error;

pub type JwtResult<T> = Result<T, JwtError>;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token was issued in the future")]
    IssuedInFuture,
    #[error("token header '{0}' is not allowed")]
    DisallowedHeader(&'static str),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no verification key registered for kid '{0}'")]
    UnknownKeyId(String),
    #[error("failed to parse key: {0}")]
    KeyParse(String),
    #[error("missing claim '{0}'")]
    MissingClaim(&'static str),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("failed to fetch JWKS: {0}")]
    KeyFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("JWKS entry missing key id (kid)")]
    JwksMissingKid,
    #[error("JWKS key '{0}' missing required RSA components")]
    JwksMissingComponents(String),
    #[error("JWKS key '{kid}' uses unsupported alg '{alg}'")]
    JwksUnsupportedAlg { kid: String, alg: String },
    #[error("no JWT client available: {0}")]
    ClientUnavailable(String),
}

impl JwtError {
    /// Whether the failure concerns claim timestamps rather than the token's integrity.
    pub fn is_timing(&self) -> bool {
        matches!(
            self,
            JwtError::Expired | JwtError::NotYetValid | JwtError::IssuedInFuture
        )
    }

    /// Failures that may succeed when retried with a different key or key set.
    pub fn is_key_resolution(&self) -> bool {
        matches!(
            self,
            JwtError::MissingKeyId
                | JwtError::UnknownKeyId(_)
                | JwtError::KeyParse(_)
                | JwtError::KeyFetch(_)
                | JwtError::JwksDecode(_)
                | JwtError::JwksMissingKid
                | JwtError::JwksMissingComponents(_)
                | JwtError::JwksUnsupportedAlg { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm(value.to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed(value.to_string()),
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey => {
                Self::KeyParse(value.to_string())
            }
            _ => Self::Verification(value.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
