//! The per-client token cache

use std::cell::RefCell;

use crate::{
    sources::{AsyncTokenSource, AuthError, AuthFlowExecutor},
    Token,
};

/// Holds the most recently obtained token of a client
///
/// Concurrent requests that find the cache empty each run their own authentication
/// flow, and whichever flow completes last determines the cached token.
#[derive(Debug)]
pub struct TokenCache<S = AuthFlowExecutor> {
    source: S,
    token: RefCell<Option<Token>>,
}

impl<S> TokenCache<S> {
    /// Constructs an empty cache in front of `source`
    pub fn new(source: S) -> Self {
        Self {
            source,
            token: RefCell::new(None),
        }
    }

    /// The underlying token source
    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The cached token, if any
    pub fn cached(&self) -> Option<Token> {
        self.token.borrow().clone()
    }
}

impl<S: AsyncTokenSource> TokenCache<S> {
    /// Gets a token, running an authentication flow when needed
    ///
    /// The cached token is returned unless `force_refresh` is set or nothing is cached
    /// yet. A freshly obtained token replaces the cached one.
    pub async fn get_token(&self, force_refresh: bool) -> Result<Token, AuthError> {
        if !force_refresh {
            if let Some(token) = self.cached() {
                tracing::trace!("using cached token");
                return Ok(token);
            }
        }

        tracing::debug!(force_refresh, "requesting new token");
        let token = self.source.request_token().await?;
        self.token.replace(Some(token.clone()));

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CountingSource {
        issued: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl AsyncTokenSource for CountingSource {
        async fn request_token(&self) -> Result<Token, AuthError> {
            let n = self.issued.get() + 1;
            self.issued.set(n);
            tokio::task::yield_now().await;
            Ok(Token::from(format!("token-{}", n)))
        }
    }

    struct FailingSource;

    #[async_trait(?Send)]
    impl AsyncTokenSource for FailingSource {
        async fn request_token(&self) -> Result<Token, AuthError> {
            Err(AuthError::Rejected)
        }
    }

    #[tokio::test]
    async fn first_request_runs_the_flow_and_caches() {
        let cache = TokenCache::new(CountingSource::default());

        let token = cache.get_token(false).await.unwrap();

        assert_eq!(token.as_str(), "token-1");
        assert_eq!(cache.cached(), Some(token));
        assert_eq!(cache.source().issued.get(), 1);
    }

    #[tokio::test]
    async fn cached_token_is_reused() {
        let cache = TokenCache::new(CountingSource::default());

        cache.get_token(false).await.unwrap();
        let again = cache.get_token(false).await.unwrap();

        assert_eq!(again.as_str(), "token-1");
        assert_eq!(cache.source().issued.get(), 1);
    }

    #[tokio::test]
    async fn forced_refresh_overwrites_the_cache() {
        let cache = TokenCache::new(CountingSource::default());

        cache.get_token(false).await.unwrap();
        let refreshed = cache.get_token(true).await.unwrap();

        assert_eq!(refreshed.as_str(), "token-2");
        assert_eq!(cache.cached().unwrap().as_str(), "token-2");
    }

    #[tokio::test]
    async fn failed_flow_leaves_the_cache_untouched() {
        let cache = TokenCache::new(FailingSource);

        assert!(cache.get_token(true).await.is_err());
        assert!(cache.cached().is_none());
    }

    // Known race: overlapping uncached requests are not coalesced. Each caller runs
    // its own flow and the last completion wins the cache.
    #[tokio::test]
    async fn concurrent_uncached_requests_each_run_a_flow() {
        let cache = TokenCache::new(CountingSource::default());

        let (first, second) = futures::join!(cache.get_token(false), cache.get_token(false));

        assert_eq!(cache.source().issued.get(), 2);
        assert_ne!(first.unwrap(), second.unwrap());
        let cached = cache.cached().unwrap();
        assert!(cached.as_str() == "token-1" || cached.as_str() == "token-2");
    }
}
