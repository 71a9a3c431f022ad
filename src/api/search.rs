use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use classroom_search::search::{CachedSearchResponse, EntityKind, SearchError};

use crate::api::ApiResponse;
use crate::state::AppState;

/// Largest page a client may request / 单页最大条数
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "q")]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize { 20 }

fn error_code(err: &SearchError) -> i32 {
    match err {
        SearchError::ProviderNotInitialized => 503,
        SearchError::CourseListing(_) => 502,
        SearchError::Timeout(_) | SearchError::Cancelled => 504,
    }
}

/// GET /api/search/:kind - 按类型搜索课程/学生/教师/作业/公告
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Json<ApiResponse<CachedSearchResponse>> {
    let kind: EntityKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => return Json(ApiResponse::error(&e)),
    };
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return Json(ApiResponse::error(&rejection.body_text())),
    };
    let limit = params.limit.min(MAX_LIMIT);

    let outcome = match kind {
        EntityKind::Course => state.search.search_courses(&params.query, limit, params.offset).await,
        EntityKind::Student => state.search.search_students(&params.query, limit, params.offset).await,
        EntityKind::Teacher => state.search.search_teachers(&params.query, limit, params.offset).await,
        EntityKind::Assignment => state.search.search_assignments(&params.query, limit, params.offset).await,
        EntityKind::Announcement => state.search.search_announcements(&params.query, limit, params.offset).await,
    };

    match outcome {
        Ok(response) => Json(ApiResponse::success(response)),
        Err(e) => {
            tracing::warn!("Search {} failed: {}", kind, e);
            Json(ApiResponse::error_with_code(error_code(&e), &e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use classroom_search::cache::MemoryCache;
    use classroom_search::models::{Announcement, Course, CourseMember, CourseWork};
    use classroom_search::provider::{EducationDataProvider, ProviderBox};
    use classroom_search::search::{ResultCache, SearchService, SearchSettings};
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct StaticProvider;

    #[async_trait]
    impl EducationDataProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }
        async fn list_courses(&self, _page_size: u32) -> Result<Vec<Course>> {
            Ok(vec![
                Course { id: "c1".to_string(), name: "Math 101".to_string(), ..Course::default() },
                Course { id: "c2".to_string(), name: "Biology".to_string(), ..Course::default() },
            ])
        }
        async fn list_students(&self, _course_id: &str) -> Result<Vec<CourseMember>> {
            Ok(Vec::new())
        }
        async fn list_teachers(&self, _course_id: &str) -> Result<Vec<CourseMember>> {
            Ok(Vec::new())
        }
        async fn list_course_work(&self, _course_id: &str) -> Result<Vec<CourseWork>> {
            Ok(Vec::new())
        }
        async fn list_announcements(&self, _course_id: &str) -> Result<Vec<Announcement>> {
            Ok(Vec::new())
        }
    }

    fn app_state(provider: Option<ProviderBox>) -> Arc<AppState> {
        let cache_store = Arc::new(MemoryCache::new(32));
        let search = SearchService::new(
            provider,
            ResultCache::new(cache_store.clone()),
            SearchSettings::default(),
            CancellationToken::new(),
        );
        Arc::new(AppState { search: Arc::new(search), cache_store })
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> Value {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_courses_endpoint() {
        let state = app_state(Some(Arc::new(StaticProvider)));
        let body = get_json(state.clone(), "/api/search/courses?q=math&limit=10").await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["results"][0]["id"], "c1");
        assert_eq!(body["data"]["results"][0]["kind"], "course");
        assert_eq!(body["data"]["results"][0]["relevance"], 1.0);
        assert_eq!(state.cache_store.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_bad_request() {
        let body = get_json(app_state(Some(Arc::new(StaticProvider))), "/api/search/grades?q=a").await;
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_malformed_paging_is_bad_request() {
        let state = app_state(Some(Arc::new(StaticProvider)));
        let body = get_json(state.clone(), "/api/search/courses?q=math&limit=abc").await;
        assert_eq!(body["code"], 400);
        assert!(body["data"].is_null());

        let body = get_json(state, "/api/search/courses?q=math&offset=-1").await;
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_missing_provider_reports_503() {
        let body = get_json(app_state(None), "/api/search/students?query=ann").await;
        assert_eq!(body["code"], 503);
        assert!(body["message"].as_str().unwrap().contains("not initialized"));
    }

    #[tokio::test]
    async fn test_health_reports_provider() {
        let body = get_json(app_state(None), "/api/health").await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider_ready"], false);
    }
}
