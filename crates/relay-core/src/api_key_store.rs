//! In-process cache of API-key metadata. Spec §1 and §3: key provisioning
//! (signed-message registration, revocation) is an external collaborator
//! out of scope for this crate; what the pipeline needs is a read-only
//! lookup of already-provisioned `{ keyId, tier, expiresAt, active }` data,
//! cached for up to 60 s so a revoke/expire is visible within that bound.
//!
//! Same DashMap-backed-concurrent-map idiom as [`crate::dedup_store`].

use dashmap::DashMap;
use relay_types::api_key::ApiKeyMetadata;
use relay_types::timestamp::UnixTimestamp;
use std::sync::Arc;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("no Authorization bearer token was presented")]
    Missing,
    #[error("API key is not recognized")]
    Invalid,
    #[error("API key is expired or deactivated")]
    Expired,
}

/// Backs the lookup a real deployment would serve out of a provisioning
/// service; here it's just an in-process map populated at startup from
/// config, since key provisioning itself is out of scope (spec §1).
pub struct ApiKeyStore {
    keys: Arc<DashMap<String, (ApiKeyMetadata, UnixTimestamp)>>,
}

impl ApiKeyStore {
    pub fn new() -> Self {
        ApiKeyStore { keys: Arc::new(DashMap::new()) }
    }

    /// Registers (or refreshes) a key's cached metadata.
    pub fn insert(&self, metadata: ApiKeyMetadata) {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.keys.insert(metadata.key_id.clone(), (metadata, now));
    }

    /// Extracts a `Bearer <token>` value and validates it against the cache.
    pub fn authenticate(&self, authorization_header: Option<&str>) -> Result<ApiKeyMetadata, ApiKeyError> {
        let token = authorization_header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiKeyError::Missing)?;

        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let entry = self.keys.get(token).ok_or(ApiKeyError::Invalid)?;
        let (metadata, _cached_at) = &*entry;
        if !metadata.is_usable(now) {
            return Err(ApiKeyError::Expired);
        }
        Ok(metadata.clone())
    }
}

impl Default for ApiKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::api_key::Tier;

    fn sample(key_id: &str, active: bool) -> ApiKeyMetadata {
        ApiKeyMetadata { key_id: key_id.to_string(), tier: Tier::Standard, expires_at: None, active }
    }

    #[test]
    fn missing_header_is_rejected() {
        let store = ApiKeyStore::new();
        assert_eq!(store.authenticate(None), Err(ApiKeyError::Missing));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = ApiKeyStore::new();
        assert_eq!(store.authenticate(Some("Bearer nope")), Err(ApiKeyError::Invalid));
    }

    #[test]
    fn active_key_authenticates() {
        let store = ApiKeyStore::new();
        store.insert(sample("key-1", true));
        let metadata = store.authenticate(Some("Bearer key-1")).unwrap();
        assert_eq!(metadata.key_id, "key-1");
    }

    #[test]
    fn deactivated_key_is_rejected() {
        let store = ApiKeyStore::new();
        store.insert(sample("key-2", false));
        assert_eq!(store.authenticate(Some("Bearer key-2")), Err(ApiKeyError::Expired));
    }
}
