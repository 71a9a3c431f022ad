use classroom_search::cache::MemoryCache;
use classroom_search::search::SearchService;
use std::sync::Arc;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub search: Arc<SearchService>,
    /// Backing store of the search cache, kept for maintenance tasks / 缓存存储
    pub cache_store: Arc<MemoryCache>,
}
