//! Token Store Module
//!
//! Hands out a valid session token, issuing a new one when the persisted
//! token is missing or expired.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::claims::is_expired;
use super::storage::SharedStorage;
use crate::clock::SharedClock;
use crate::error::{Result, SearchError};
use crate::models::TokenRequest;
use crate::upstream::SharedUpstream;

/// Storage key of the stable visitor identifier
pub const VISITOR_ID_KEY: &str = "visitorId";

/// Storage key of the current session token
pub const TOKEN_KEY: &str = "visitorSessionToken";

// == Token Store ==
/// Session token provider.
pub struct TokenStore {
    upstream: SharedUpstream,
    storage: SharedStorage,
    clock: SharedClock,
    site_name: String,
    user_agent: String,
    /// Serializes refreshes so concurrent callers share one issuance
    refresh: Mutex<()>,
}

impl TokenStore {
    // == Constructor ==
    pub fn new(
        upstream: SharedUpstream,
        storage: SharedStorage,
        clock: SharedClock,
        site_name: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            storage,
            clock,
            site_name: site_name.into(),
            user_agent: user_agent.into(),
            refresh: Mutex::new(()),
        }
    }

    // == Token ==
    /// Returns a usable session token.
    ///
    /// The persisted token is reused while its `exp` claim has not passed.
    /// Otherwise a new one is issued and persisted. Any failure yields
    /// [`SearchError::TokenUnavailable`]; callers must not search without a
    /// token.
    pub async fn token(&self) -> Result<String> {
        let _guard = self.refresh.lock().await;

        if let Some(token) = self.persisted_token()? {
            return Ok(token);
        }

        let request = TokenRequest {
            visitor_id: self.visitor_id()?,
            user_agent: self.user_agent.clone(),
            site_name: self.site_name.clone(),
        };

        let token = self.upstream.issue_token(&request).await.map_err(|e| {
            warn!(error = %e, "failed to obtain visitor session token");
            SearchError::TokenUnavailable(e.to_string())
        })?;

        if token.is_empty() {
            warn!("token endpoint returned an empty token");
            return Err(SearchError::TokenUnavailable(
                "token endpoint returned an empty token".to_string(),
            ));
        }

        // A token that cannot be persisted is still good for this session.
        if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
            warn!(error = %e, "failed to persist session token");
        }

        info!("issued new visitor session token");
        Ok(token)
    }

    // == Visitor Id ==
    /// Returns the stable visitor identifier, creating it on first use.
    pub fn visitor_id(&self) -> Result<String> {
        if let Some(id) = self.storage.get(VISITOR_ID_KEY)?.filter(|id| !id.is_empty()) {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.storage.set(VISITOR_ID_KEY, &id)?;
        debug!("created visitor id");
        Ok(id)
    }

    fn persisted_token(&self) -> Result<Option<String>> {
        let Some(token) = self.storage.get(TOKEN_KEY)? else {
            return Ok(None);
        };

        if is_expired(&token, self.clock.now_secs()) {
            debug!("persisted session token expired");
            return Ok(None);
        }
        Ok(Some(token))
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("storage", &self.storage)
            .field("site_name", &self.site_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{RawRecord, SiteParams, SourceKind};
    use crate::token::{MemoryStorage, SessionStorage};
    use crate::upstream::Upstream;
    use async_trait::async_trait;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    fn token_expiring_at(exp: u64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("h.{payload}.s")
    }

    /// Issues tokens expiring one hour after `issued_at`, or fails.
    #[derive(Default)]
    struct TokenIssuer {
        calls: AtomicUsize,
        fail: bool,
        issued_at: u64,
        requests: StdMutex<Vec<TokenRequest>>,
    }

    #[async_trait]
    impl Upstream for TokenIssuer {
        async fn issue_token(&self, request: &TokenRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            tokio::task::yield_now().await;
            if self.fail {
                return Err(SearchError::Status { status: 500 });
            }
            Ok(token_expiring_at(self.issued_at + 3600))
        }

        async fn search(
            &self,
            _source: SourceKind,
            _query: &str,
            _params: &SiteParams,
            _token: &str,
        ) -> Result<Vec<RawRecord>> {
            unreachable!("token tests never search")
        }

        async fn suggestions(&self, _: &str, _: &SiteParams, _: &str) -> Result<Vec<Value>> {
            unreachable!("token tests never fetch suggestions")
        }
    }

    const NOW_SECS: u64 = 1_700_000_000;

    fn store_with(issuer: Arc<TokenIssuer>) -> (TokenStore, Arc<MemoryStorage>, Arc<ManualClock>) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(NOW_SECS * 1000));
        let store = TokenStore::new(issuer, storage.clone(), clock.clone(), "acme", "test-agent");
        (store, storage, clock)
    }

    #[tokio::test]
    async fn test_issues_and_persists_token() {
        let issuer = Arc::new(TokenIssuer {
            issued_at: NOW_SECS,
            ..Default::default()
        });
        let (store, storage, _) = store_with(issuer.clone());

        let token = store.token().await.unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), Some(token));

        let requests = issuer.requests.lock().unwrap();
        assert_eq!(requests[0].site_name, "acme");
        assert_eq!(requests[0].user_agent, "test-agent");
        assert_eq!(Some(requests[0].visitor_id.clone()), storage.get(VISITOR_ID_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_reuses_unexpired_token() {
        let issuer = Arc::new(TokenIssuer {
            issued_at: NOW_SECS,
            ..Default::default()
        });
        let (store, _, _) = store_with(issuer.clone());

        let first = store.token().await.unwrap();
        let second = store.token().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_expired_token() {
        let issuer = Arc::new(TokenIssuer {
            issued_at: NOW_SECS,
            ..Default::default()
        });
        let (store, _, clock) = store_with(issuer.clone());

        store.token().await.unwrap();
        clock.advance(Duration::from_secs(3601));
        store.token().await.unwrap();

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_garbage_persisted_token_is_replaced() {
        let issuer = Arc::new(TokenIssuer {
            issued_at: NOW_SECS,
            ..Default::default()
        });
        let (store, storage, _) = store_with(issuer.clone());
        storage.set(TOKEN_KEY, "null").unwrap();

        let token = store.token().await.unwrap();
        assert_ne!(token, "null");
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_issue_failure_is_token_unavailable() {
        let issuer = Arc::new(TokenIssuer {
            fail: true,
            ..Default::default()
        });
        let (store, storage, _) = store_with(issuer);

        let result = store.token().await;
        assert!(matches!(result, Err(SearchError::TokenUnavailable(_))));
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_issuance() {
        let issuer = Arc::new(TokenIssuer {
            issued_at: NOW_SECS,
            ..Default::default()
        });
        let (store, _, _) = store_with(issuer.clone());

        let (a, b) = tokio::join!(store.token(), store.token());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_visitor_id_is_stable() {
        let (store, _, _) = store_with(Arc::new(TokenIssuer::default()));
        let first = store.visitor_id().unwrap();
        let second = store.visitor_id().unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
