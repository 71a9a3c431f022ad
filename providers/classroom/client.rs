//! Google Classroom 数据源实现
//!
//! 支持 access_token 直接访问、refresh_token 在线刷新
//! 列表接口按 nextPageToken 翻页直到结束

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::types::{
    AnnouncementsPage, CourseWorkPage, CoursesPage, PagedResponse, StudentsPage, TeachersPage, TokenError,
    TokenResponse,
};
use crate::config::{ClassroomConfig, MAX_COURSE_PAGE_SIZE};
use crate::models::{Announcement, Course, CourseWork, Student, Teacher};
use crate::provider::EducationDataProvider;

// ============ 常量 ============

/// 子集合分页大小（API 允许的上限）
const NESTED_PAGE_SIZE: u32 = 100;
/// 单次 HTTP 请求超时
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// ============ 数据源主体 ============

/// Google Classroom 数据源
pub struct ClassroomProvider {
    config: ClassroomConfig,
    client: Client,
    access_token: Arc<RwLock<Option<String>>>,
    /// 同一时间只允许一个刷新请求
    refresh_lock: Mutex<()>,
}

impl ClassroomProvider {
    /// 创建新的数据源实例
    pub fn new(config: ClassroomConfig) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let access_token = if config.access_token.is_empty() {
            None
        } else {
            Some(config.access_token.clone())
        };
        Ok(Self {
            config,
            client,
            access_token: Arc::new(RwLock::new(access_token)),
            refresh_lock: Mutex::new(()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// 获取访问令牌
    async fn get_access_token(&self) -> Result<String> {
        let current = self.access_token.read().await.clone();
        match current {
            Some(token) => Ok(token),
            None => self.refresh_if_stale(None).await,
        }
    }

    /// 串行刷新令牌，拿到锁后若令牌已被其他请求换新则直接复用
    async fn refresh_if_stale(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.access_token.read().await.clone();
        if let Some(token) = current {
            if stale != Some(token.as_str()) {
                return Ok(token);
            }
        }
        self.do_refresh_token().await
    }

    /// 刷新访问令牌
    async fn do_refresh_token(&self) -> Result<String> {
        if !self.config.can_refresh() {
            return Err(anyhow!("未配置refresh_token或client_id/client_secret，无法刷新令牌"));
        }

        let mut params = HashMap::new();
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("client_secret", self.config.client_secret.as_str());
        params.insert("refresh_token", self.config.refresh_token.as_str());
        params.insert("grant_type", "refresh_token");

        let response = self.client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let token_resp: TokenResponse = response.json().await?;
            {
                let mut at = self.access_token.write().await;
                *at = Some(token_resp.access_token.clone());
            }
            tracing::debug!("Classroom access token refreshed");
            Ok(token_resp.access_token)
        } else {
            let error: TokenError = response.json().await
                .unwrap_or_else(|_| TokenError {
                    error: "unknown".to_string(),
                    error_description: Some("解析错误响应失败".to_string()),
                });
            Err(anyhow!("Token刷新失败: {}", error.error_description.unwrap_or(error.error)))
        }
    }

    /// 发起GET请求，401时刷新令牌后重试一次
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let token = self.get_access_token().await?;

        let response = self.client
            .get(url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.config.can_refresh() {
            let new_token = self.refresh_if_stale(Some(&token)).await?;
            return Ok(self.client
                .get(url)
                .bearer_auth(&new_token)
                .query(query)
                .send()
                .await?);
        }

        Ok(response)
    }

    /// 翻页获取完整列表
    async fn list_all<P: PagedResponse>(&self, path: &str, page_size: u32) -> Result<Vec<P::Item>> {
        let url = self.url(path);
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.to_string())];
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.get(&url, &query).await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(anyhow!("获取列表失败 {} ({}): {}", path, status, text));
            }

            let page: P = response.json().await?;
            let (items, next) = page.into_parts();
            all_items.extend(items);

            page_token = next.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        Ok(all_items)
    }

    fn course_path(course_id: &str, collection: &str) -> String {
        format!("courses/{}/{}", urlencoding::encode(course_id), collection)
    }
}

#[async_trait]
impl EducationDataProvider for ClassroomProvider {
    fn name(&self) -> &str {
        "google_classroom"
    }

    async fn list_courses(&self, page_size: u32) -> Result<Vec<Course>> {
        let page_size = page_size.clamp(1, MAX_COURSE_PAGE_SIZE);
        self.list_all::<CoursesPage>("courses", page_size).await
    }

    async fn list_students(&self, course_id: &str) -> Result<Vec<Student>> {
        self.list_all::<StudentsPage>(&Self::course_path(course_id, "students"), NESTED_PAGE_SIZE).await
    }

    async fn list_teachers(&self, course_id: &str) -> Result<Vec<Teacher>> {
        self.list_all::<TeachersPage>(&Self::course_path(course_id, "teachers"), NESTED_PAGE_SIZE).await
    }

    async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseWork>> {
        self.list_all::<CourseWorkPage>(&Self::course_path(course_id, "courseWork"), NESTED_PAGE_SIZE).await
    }

    async fn list_announcements(&self, course_id: &str) -> Result<Vec<Announcement>> {
        self.list_all::<AnnouncementsPage>(&Self::course_path(course_id, "announcements"), NESTED_PAGE_SIZE).await
    }
}
