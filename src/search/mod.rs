//! Search module - multi-entity classroom search / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - Providers only expose listing primitives, the search module owns the flow
//! - No local index: every cache miss scans live provider listings
//! - Cache is an optimization only, results are identical on hit and miss
//!
//! Pipeline / 流程：cache lookup → fetch → match → dedup → rank → paginate → cache store

pub mod cache;
pub mod entities;
pub mod matcher;
pub mod ranking;
pub mod service;
pub mod types;

pub use cache::{cache_key, ResultCache, SEARCH_CACHE_TTL};
pub use matcher::{normalize_query, QueryMatcher};
pub use service::{SearchError, SearchService, SearchSettings};
pub use types::{CachedSearchResponse, EntityKind, ResultMetadata, SearchResult};
