use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{JwtError, JwtResult};

/// Claims of a token whose signature and timestamps have been checked.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedClaims {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub token_id: Option<String>,
    pub raw: Value,
}

impl VerifiedClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    pub fn has_audience(&self, audience: &str) -> bool {
        self.audience.iter().any(|value| value == audience)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<AudienceRepr>,
    #[serde(default)]
    exp: Option<Number>,
    #[serde(default)]
    iat: Option<Number>,
    #[serde(default)]
    nbf: Option<Number>,
    #[serde(default)]
    jti: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

/// NumericDate per RFC 7519; fractional seconds are truncated.
fn numeric_date(name: &'static str, value: &Number) -> JwtResult<DateTime<Utc>> {
    let seconds = match value.as_i64() {
        Some(seconds) => Some(seconds),
        None => value
            .as_f64()
            .filter(|float| float.is_finite() && *float >= i64::MIN as f64 && *float < i64::MAX as f64)
            .map(|float| float.trunc() as i64),
    };
    seconds
        .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
        .ok_or_else(|| JwtError::InvalidClaim(name, value.to_string()))
}

fn optional_date(name: &'static str, value: Option<Number>) -> JwtResult<Option<DateTime<Utc>>> {
    value.map(|number| numeric_date(name, &number)).transpose()
}

impl TryFrom<Value> for VerifiedClaims {
    type Error = JwtError;

    fn try_from(value: Value) -> JwtResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| JwtError::Malformed(format!("claims: {err}")))?;

        let exp = repr.exp.ok_or(JwtError::MissingClaim("exp"))?;
        let expires_at = numeric_date("exp", &exp)?;
        let issued_at = optional_date("iat", repr.iat)?;
        let not_before = optional_date("nbf", repr.nbf)?;

        let audience = match repr.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            issuer: repr.iss,
            subject: repr.sub,
            audience,
            expires_at,
            issued_at,
            not_before,
            token_id: repr.jti,
            raw: value,
        })
    }
}
