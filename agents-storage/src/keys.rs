//! API key material.
//!
//! Keys look like `sk_<public_id>.<secret>`. The public id is stored in the
//! clear and used for lookup; only the SHA-256 hash of the whole key is
//! persisted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

pub const API_KEY_PREFIX: &str = "sk_";
const PUBLIC_ID_LEN: usize = 12;
const SECRET_BYTES: usize = 32;

/// A freshly generated key. `key` is shown to the caller once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedApiKey {
    pub key: String,
    pub public_id: String,
    pub key_hash: String,
    pub key_prefix: String,
}

pub fn generate_api_key() -> GeneratedApiKey {
    let mut rng = rand::rng();
    let public_id: String = (0..PUBLIC_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect();
    let mut secret = [0u8; SECRET_BYTES];
    rng.fill(&mut secret);
    let key = format!(
        "{API_KEY_PREFIX}{public_id}.{}",
        URL_SAFE_NO_PAD.encode(secret)
    );
    GeneratedApiKey {
        key_hash: hash_api_key(&key),
        key_prefix: format!("{API_KEY_PREFIX}{public_id}"),
        key,
        public_id,
    }
}

/// Split a key into its public id and secret. `None` if it is not shaped
/// like an API key.
pub fn parse_api_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(API_KEY_PREFIX)?;
    let (public_id, secret) = rest.split_once('.')?;
    if public_id.is_empty() || secret.is_empty() {
        return None;
    }
    Some((public_id, secret))
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Compare a presented key with a stored hash in constant time.
pub fn verify_api_key(key: &str, key_hash: &str) -> bool {
    let computed = hash_api_key(key);
    if computed.len() != key_hash.len() {
        return false;
    }
    computed
        .bytes()
        .zip(key_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
