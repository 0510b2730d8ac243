use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{redirect, Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::JwtSettings;
use crate::error::{JwtError, JwtResult};
use crate::keys::{Algorithm, TokenHeader, VerificationKey};
use crate::resolver::{KeyResolver, KeyStore};

/// Largest key set body accepted from a remote endpoint.
pub const MAX_JWKS_BYTES: usize = 256 * 1024;

/// Key sets reached through `jku` headers kept at once.
pub const DEFAULT_JKU_CAPACITY: usize = 16;

/// Downloads JWK sets and converts their RSA entries into verification keys.
///
/// Redirects are not followed, so only URLs that passed the scheme check are
/// ever contacted.
#[derive(Debug, Clone)]
pub struct JwksFetcher {
    client: Client,
}

impl JwksFetcher {
    pub fn new() -> JwtResult<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| JwtError::KeyFetch(format!("building HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> JwtResult<Vec<(String, VerificationKey)>> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| fetch_error(err, url, timeout))?;

        if !response.status().is_success() {
            return Err(JwtError::KeyFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bytes = read_limited(response, url, timeout).await?;
        let body: JwksResponse =
            serde_json::from_slice(&bytes).map_err(|err| JwtError::JwksDecode(err.to_string()))?;

        let mut keys = Vec::new();
        for key in body.keys.into_iter() {
            let kid = key.kid.ok_or(JwtError::JwksMissingKid)?;
            let kty = key.kty.unwrap_or_else(|| "RSA".to_string());
            if kty != "RSA" {
                warn!(kid, kty, url, "skipping JWKS key with unsupported key type");
                continue;
            }

            if let Some(alg) = key.alg {
                let supported = alg.parse::<Algorithm>().map(Algorithm::is_rsa).unwrap_or(false);
                if !supported {
                    return Err(JwtError::JwksUnsupportedAlg { kid, alg });
                }
            }

            let modulus = key
                .n
                .ok_or_else(|| JwtError::JwksMissingComponents(kid.clone()))?;
            let exponent = key
                .e
                .ok_or_else(|| JwtError::JwksMissingComponents(kid.clone()))?;

            keys.push((kid, VerificationKey::rsa_components(modulus, exponent)));
        }

        Ok(keys)
    }
}

fn fetch_error(err: reqwest::Error, url: &str, timeout: Duration) -> JwtError {
    if err.is_timeout() {
        JwtError::KeyFetch(format!("timed out after {timeout:?} fetching {url}"))
    } else {
        JwtError::KeyFetch(err.to_string())
    }
}

async fn read_limited(mut response: Response, url: &str, timeout: Duration) -> JwtResult<Vec<u8>> {
    let too_large = || JwtError::KeyFetch(format!("key set from {url} exceeds {MAX_JWKS_BYTES} bytes"));

    if response
        .content_length()
        .is_some_and(|length| length > MAX_JWKS_BYTES as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| fetch_error(err, url, timeout))?
    {
        if body.len() + chunk.len() > MAX_JWKS_BYTES {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug)]
struct CachedKeySet {
    keys: KeyStore,
    fetched_at: Instant,
}

/// Fetched key sets by URL. Sets reached through `jku` are evicted oldest
/// first once more than `jku_capacity` are held; the configured set never is.
#[derive(Debug, Default)]
struct KeySetCache {
    sets: HashMap<String, CachedKeySet>,
    jku_order: VecDeque<String>,
}

impl KeySetCache {
    fn store(
        &mut self,
        url: &str,
        keys: Vec<(String, VerificationKey)>,
        configured: bool,
        jku_capacity: usize,
    ) {
        let store = KeyStore::new();
        store.replace_all(keys);
        let entry = CachedKeySet {
            keys: store,
            fetched_at: Instant::now(),
        };
        if self.sets.insert(url.to_string(), entry).is_some() || configured {
            return;
        }

        self.jku_order.push_back(url.to_string());
        while self.jku_order.len() > jku_capacity {
            if let Some(evicted) = self.jku_order.pop_front() {
                self.sets.remove(&evicted);
                debug!(url = %evicted, "evicted cached key set");
            }
        }
    }
}

enum Lookup {
    Hit(VerificationKey),
    /// The set was fetched within the refresh interval and lacks the key.
    RecentlyRefreshed,
    Stale,
}

/// Resolves keys from a platform's published JWK set, cached per URL.
///
/// A token's `jku` header selects the key set only when
/// [`JwtSettings::allow_jku_header`] is set; otherwise the configured URL is
/// used. An unknown `kid` triggers a refetch unless the set was fetched less
/// than [`JwtSettings::jwks_min_refresh`] ago.
#[derive(Debug)]
pub struct JwksResolver {
    fetcher: JwksFetcher,
    url: Option<String>,
    jku_capacity: usize,
    cache: RwLock<KeySetCache>,
}

impl JwksResolver {
    pub fn new(url: impl Into<String>) -> JwtResult<Self> {
        Ok(Self::build(Some(url.into()), JwksFetcher::new()?))
    }

    /// Resolver that only follows `jku` headers.
    pub fn jku_only() -> JwtResult<Self> {
        Ok(Self::build(None, JwksFetcher::new()?))
    }

    fn build(url: Option<String>, fetcher: JwksFetcher) -> Self {
        Self {
            fetcher,
            url,
            jku_capacity: DEFAULT_JKU_CAPACITY,
            cache: RwLock::new(KeySetCache::default()),
        }
    }

    pub fn with_jku_capacity(mut self, capacity: usize) -> Self {
        self.jku_capacity = capacity;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn cached(&self, url: &str, kid: &str) -> Option<VerificationKey> {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        guard.sets.get(url).and_then(|set| set.keys.get(kid))
    }

    /// Number of key sets currently held.
    pub fn cached_key_sets(&self) -> usize {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        guard.sets.len()
    }

    /// Fetch `url` and replace its cached keys, returning how many were loaded.
    pub async fn refresh(&self, url: &str, settings: &JwtSettings) -> JwtResult<usize> {
        let keys = self.fetcher.fetch(url, settings.jwks_timeout).await?;
        let count = keys.len();
        let configured = self.url.as_deref() == Some(url);
        {
            let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            guard.store(url, keys, configured, self.jku_capacity);
        }
        info!(url, count, "refreshed JWKS");
        Ok(count)
    }

    fn lookup(&self, url: &str, kid: &str, min_refresh: Duration) -> Lookup {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match guard.sets.get(url) {
            Some(set) => match set.keys.get(kid) {
                Some(key) => Lookup::Hit(key),
                None if set.fetched_at.elapsed() < min_refresh => Lookup::RecentlyRefreshed,
                None => Lookup::Stale,
            },
            None => Lookup::Stale,
        }
    }

    fn key_set_url<'a>(
        &'a self,
        header: &'a TokenHeader,
        settings: &JwtSettings,
    ) -> JwtResult<&'a str> {
        let url = match header.jku.as_deref() {
            Some(_) if !settings.allow_jku_header => return Err(JwtError::DisallowedHeader("jku")),
            Some(jku) => jku,
            None => self
                .url
                .as_deref()
                .ok_or_else(|| JwtError::KeyFetch("no key set URL configured".to_string()))?,
        };

        let parsed =
            Url::parse(url).map_err(|err| JwtError::KeyFetch(format!("invalid key set URL '{url}': {err}")))?;
        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(JwtError::KeyFetch(format!(
                "unsupported key set URL scheme '{}'",
                parsed.scheme()
            )));
        }
        Ok(url)
    }
}

#[async_trait]
impl KeyResolver for JwksResolver {
    async fn resolve(
        &self,
        header: &TokenHeader,
        settings: &JwtSettings,
    ) -> JwtResult<VerificationKey> {
        let kid = header.kid.as_deref().ok_or(JwtError::MissingKeyId)?;
        let url = self.key_set_url(header, settings)?;

        match self.lookup(url, kid, settings.jwks_min_refresh) {
            Lookup::Hit(key) => return Ok(key),
            Lookup::RecentlyRefreshed => {
                debug!(kid, url, "kid unknown and key set refreshed recently");
                return Err(JwtError::UnknownKeyId(kid.to_string()));
            }
            Lookup::Stale => {}
        }

        debug!(kid, url, "kid not cached, fetching JWKS");
        self.refresh(url, settings).await?;
        self.cached(url, kid)
            .ok_or_else(|| JwtError::UnknownKeyId(kid.to_string()))
    }
}
