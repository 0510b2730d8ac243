#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lti_jwt::{
    Algorithm, JsonWebTokenClient, JwtSettings, ManualClock, SigningKey, VerificationKey,
};
use once_cell::sync::Lazy;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Map, Value};

pub const NOW: i64 = 1_700_000_000;
pub const KID: &str = "platform-key-1";

pub struct KeyMaterial {
    pub private_pem: String,
    pub public_pem: String,
    pub modulus: String,
    pub exponent: String,
}

impl KeyMaterial {
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::rsa_pem(Algorithm::RS256, self.private_pem.as_bytes()).with_kid(KID)
    }

    pub fn verification_key(&self) -> VerificationKey {
        VerificationKey::rsa_pem(self.public_pem.as_bytes())
    }

    pub fn jwks(&self, kid: &str) -> Value {
        json!({
            "keys": [
                {
                    "kid": kid,
                    "kty": "RSA",
                    "alg": "RS256",
                    "use": "sig",
                    "n": self.modulus,
                    "e": self.exponent
                }
            ]
        })
    }
}

fn generate_key_material() -> KeyMaterial {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("private pem")
        .to_string();
    let public_pem = public_key.to_pkcs1_pem(LineEnding::LF).expect("public pem");
    let modulus = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let exponent = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

    KeyMaterial {
        private_pem,
        public_pem,
        modulus,
        exponent,
    }
}

pub static PLATFORM_KEY: Lazy<KeyMaterial> = Lazy::new(generate_key_material);
pub static OTHER_KEY: Lazy<KeyMaterial> = Lazy::new(generate_key_material);

pub fn manual_client() -> (JsonWebTokenClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_timestamp(NOW));
    (JsonWebTokenClient::with_clock(clock.clone()), clock)
}

pub fn launch_claims() -> Map<String, Value> {
    let claims = json!({
        "iss": "https://platform.test",
        "sub": "user-42",
        "aud": "tool-client-id",
        "nonce": "nonce-1",
        "https://purl.imsglobal.org/spec/lti/claim/message_type": "LtiResourceLinkRequest"
    });
    match claims {
        Value::Object(map) => map,
        _ => unreachable!("literal is an object"),
    }
}

pub fn settings() -> JwtSettings {
    JwtSettings::default()
}
