//! Pluggable JWT handling for LTI message exchange.
//!
//! Token operations go through the [`JwtClient`] trait. The active client is
//! held by a [`JwtClientRegistry`], and every operation reads its lifetime,
//! leeway and header policy from an explicit [`JwtSettings`] value.

pub mod claims;
pub mod client;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod jsonwebtoken_client;
pub mod jwks;
pub mod keys;
pub mod registry;
pub mod resolver;

pub use claims::VerifiedClaims;
pub use client::JwtClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::JwtSettings;
pub use context::JwtContext;
pub use error::{ConfigError, JwtError, JwtResult};
pub use jsonwebtoken_client::JsonWebTokenClient;
pub use jwks::{JwksFetcher, JwksResolver, DEFAULT_JKU_CAPACITY, MAX_JWKS_BYTES};
pub use keys::{Algorithm, KeyMaterial, SigningKey, TokenHeader, VerificationKey};
pub use registry::JwtClientRegistry;
pub use resolver::{KeyResolver, KeyStore};
