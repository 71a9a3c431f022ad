//! Education data provider interface / 课堂数据源接口
//!
//! Providers only expose listing primitives. Aggregation, matching and
//! failure policy live in the search module.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{Announcement, Course, CourseWork, Student, Teacher};

pub type ProviderBox = Arc<dyn EducationDataProvider>;

/// Remote classroom data source (provides only primitive operations) / 课堂数据源
///
/// Every call is cancelled by dropping its future.
#[async_trait]
pub trait EducationDataProvider: Send + Sync {
    /// Provider name / 数据源名称
    fn name(&self) -> &str;

    /// List courses visible to the credentials / 列出课程
    async fn list_courses(&self, page_size: u32) -> Result<Vec<Course>>;

    /// List students of one course / 列出课程学生
    async fn list_students(&self, course_id: &str) -> Result<Vec<Student>>;

    /// List teachers of one course / 列出课程教师
    async fn list_teachers(&self, course_id: &str) -> Result<Vec<Teacher>>;

    /// List course work of one course / 列出课程作业
    async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseWork>>;

    /// List announcements of one course / 列出课程公告
    async fn list_announcements(&self, course_id: &str) -> Result<Vec<Announcement>>;
}
