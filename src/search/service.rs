//! Search facade / 搜索门面
//!
//! One public operation per entity kind, each composing
//! cache lookup → fetch → match → dedup → rank → paginate → cache store.
//! The cached unit is the paginated window plus the true total, keyed by
//! `(kind, normalized query, limit, offset)`.

use parking_lot::RwLock;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::cache::{cache_key, ResultCache};
use super::entities::{collect_matches, CourseListingError, FetchOptions};
use super::matcher::QueryMatcher;
use super::ranking::{dedup_by_id, paginate, rank};
use super::types::{CachedSearchResponse, EntityKind};
use crate::config::SearchConfig;
use crate::provider::ProviderBox;

/// Errors visible to search callers / 搜索错误
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("education data provider not initialized")]
    ProviderNotInitialized,
    #[error("failed to list courses: {0:#}")]
    CourseListing(anyhow::Error),
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    #[error("search cancelled")]
    Cancelled,
}

impl From<CourseListingError> for SearchError {
    fn from(err: CourseListingError) -> Self {
        SearchError::CourseListing(err.0)
    }
}

/// Search service settings / 搜索服务参数
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub fetch: FetchOptions,
    pub request_timeout: Duration,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            fetch: FetchOptions {
                course_page_size: config.effective_page_size(),
                course_concurrency: config.effective_concurrency(),
            },
            request_timeout: config.request_timeout(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

/// Multi-entity search service / 多实体搜索服务
pub struct SearchService {
    provider: RwLock<Option<ProviderBox>>,
    cache: ResultCache,
    settings: SearchSettings,
    cancel: CancellationToken,
}

impl SearchService {
    pub fn new(
        provider: Option<ProviderBox>,
        cache: ResultCache,
        settings: SearchSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider: RwLock::new(provider),
            cache,
            settings,
            cancel,
        }
    }

    /// Install or replace the provider / 设置数据源
    pub fn set_provider(&self, provider: ProviderBox) {
        tracing::info!("Education data provider set: {}", provider.name());
        *self.provider.write() = Some(provider);
    }

    /// Remove the provider; searches fail until a new one is set / 移除数据源
    pub fn clear_provider(&self) {
        *self.provider.write() = None;
    }

    pub fn has_provider(&self) -> bool {
        self.provider.read().is_some()
    }

    pub async fn search_courses(&self, query: &str, limit: usize, offset: usize) -> Result<CachedSearchResponse, SearchError> {
        self.search(EntityKind::Course, query, limit, offset).await
    }

    pub async fn search_students(&self, query: &str, limit: usize, offset: usize) -> Result<CachedSearchResponse, SearchError> {
        self.search(EntityKind::Student, query, limit, offset).await
    }

    pub async fn search_teachers(&self, query: &str, limit: usize, offset: usize) -> Result<CachedSearchResponse, SearchError> {
        self.search(EntityKind::Teacher, query, limit, offset).await
    }

    pub async fn search_assignments(&self, query: &str, limit: usize, offset: usize) -> Result<CachedSearchResponse, SearchError> {
        self.search(EntityKind::Assignment, query, limit, offset).await
    }

    pub async fn search_announcements(&self, query: &str, limit: usize, offset: usize) -> Result<CachedSearchResponse, SearchError> {
        self.search(EntityKind::Announcement, query, limit, offset).await
    }

    /// Search one entity kind / 搜索指定类型
    ///
    /// Runs under the configured deadline and the service cancellation
    /// token. A call that times out or is cancelled writes nothing to the
    /// cache.
    pub async fn search(
        &self,
        kind: EntityKind,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<CachedSearchResponse, SearchError> {
        let provider = self
            .provider
            .read()
            .clone()
            .ok_or(SearchError::ProviderNotInitialized)?;

        let timeout = self.settings.request_timeout;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(SearchError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.run(provider, kind, query, limit, offset)) => {
                outcome.map_err(|_| {
                    tracing::warn!("{} search for {:?} timed out after {:?}", kind, query, timeout);
                    SearchError::Timeout(timeout)
                })?
            }
        }
    }

    async fn run(
        &self,
        provider: ProviderBox,
        kind: EntityKind,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<CachedSearchResponse, SearchError> {
        let matcher = QueryMatcher::new(query);
        let key = cache_key(kind, matcher.query(), limit, offset);

        if let Some(cached) = self.cache.lookup(&key).await {
            tracing::debug!("Search cache hit: {} {:?} limit={} offset={}", kind, matcher.query(), limit, offset);
            return Ok(cached);
        }
        tracing::debug!("Search cache miss: {} {:?} limit={} offset={}", kind, matcher.query(), limit, offset);

        let mut results = collect_matches(provider.as_ref(), kind, &matcher, self.settings.fetch)
            .await
            .map_err(|e| {
                tracing::error!("{} search failed listing courses: {:#}", kind, e.0);
                SearchError::from(e)
            })?;

        if kind.needs_dedup() {
            results = dedup_by_id(results);
        }
        rank(&mut results);
        let (results, total) = paginate(results, limit, offset);
        let response = CachedSearchResponse { results, total };

        self.cache.store(&key, &response).await;
        Ok(response)
    }
}
