//! Query matching and tiered relevance / 查询匹配与相关度分级
//!
//! Matching is case-insensitive substring containment. An empty query
//! matches every candidate at the kind's fallback tier.

use crate::models::{Announcement, Course, CourseWork, UserProfile};

/// Relevance tiers per entity kind / 各类型相关度分级
pub mod tiers {
    pub const COURSE_NAME_PREFIX: f64 = 1.0;
    pub const COURSE_NAME_CONTAINS: f64 = 0.8;
    pub const COURSE_DESCRIPTION: f64 = 0.6;
    pub const COURSE_FALLBACK: f64 = 0.5;

    pub const PERSON_NAME_PREFIX: f64 = 1.0;
    pub const PERSON_EMAIL_PREFIX: f64 = 0.9;
    pub const PERSON_CONTAINS: f64 = 0.7;

    pub const ASSIGNMENT_TITLE_PREFIX: f64 = 1.0;
    pub const ASSIGNMENT_TITLE_CONTAINS: f64 = 0.8;
    pub const ASSIGNMENT_DESCRIPTION: f64 = 0.6;

    pub const ANNOUNCEMENT_PREFIX: f64 = 1.0;
    pub const ANNOUNCEMENT_CONTAINS: f64 = 0.5;
}

/// Normalize a raw query for matching and cache keys / 规范化查询
///
/// Only case is collapsed. Whitespace is part of the query, so `"math "`
/// does not match `"Mathematics"`.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

/// Query matcher / 查询匹配器
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: String,
}

impl QueryMatcher {
    pub fn new(query: &str) -> Self {
        Self { query: normalize_query(query) }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Empty query lists everything / 空查询匹配全部
    pub fn is_match_all(&self) -> bool {
        self.query.is_empty()
    }

    fn contains(&self, field: &str) -> bool {
        field.to_lowercase().contains(&self.query)
    }

    fn starts(&self, field: &str) -> bool {
        field.to_lowercase().starts_with(&self.query)
    }

    fn contains_opt(&self, field: Option<&String>) -> bool {
        field.map(|f| self.contains(f)).unwrap_or(false)
    }

    /// Score a course / 课程评分
    ///
    /// name prefix 1.0, name contains 0.8, description 0.6,
    /// section / room / heading 0.5.
    pub fn course(&self, course: &Course) -> Option<f64> {
        if self.is_match_all() {
            return Some(tiers::COURSE_FALLBACK);
        }
        if self.starts(&course.name) {
            return Some(tiers::COURSE_NAME_PREFIX);
        }
        if self.contains(&course.name) {
            return Some(tiers::COURSE_NAME_CONTAINS);
        }
        if self.contains_opt(course.description.as_ref()) {
            return Some(tiers::COURSE_DESCRIPTION);
        }
        if self.contains_opt(course.section.as_ref())
            || self.contains_opt(course.room.as_ref())
            || self.contains_opt(course.description_heading.as_ref())
        {
            return Some(tiers::COURSE_FALLBACK);
        }
        None
    }

    /// Score a student or teacher profile / 成员评分
    ///
    /// name prefix 1.0, email prefix 0.9, name or email contains 0.7.
    pub fn person(&self, profile: &UserProfile) -> Option<f64> {
        if self.is_match_all() {
            return Some(tiers::PERSON_CONTAINS);
        }
        let name = profile.display_name();
        if self.starts(&name) {
            return Some(tiers::PERSON_NAME_PREFIX);
        }
        if self.starts(&profile.email_address) {
            return Some(tiers::PERSON_EMAIL_PREFIX);
        }
        if self.contains(&name) || self.contains(&profile.email_address) {
            return Some(tiers::PERSON_CONTAINS);
        }
        None
    }

    /// Score an assignment / 作业评分
    ///
    /// title prefix 1.0, title contains 0.8, description 0.6.
    pub fn assignment(&self, work: &CourseWork) -> Option<f64> {
        if self.is_match_all() {
            return Some(tiers::ASSIGNMENT_DESCRIPTION);
        }
        if self.starts(&work.title) {
            return Some(tiers::ASSIGNMENT_TITLE_PREFIX);
        }
        if self.contains(&work.title) {
            return Some(tiers::ASSIGNMENT_TITLE_CONTAINS);
        }
        if self.contains_opt(work.description.as_ref()) {
            return Some(tiers::ASSIGNMENT_DESCRIPTION);
        }
        None
    }

    /// Score an announcement / 公告评分
    ///
    /// text prefix 1.0, text contains 0.5.
    pub fn announcement(&self, announcement: &Announcement) -> Option<f64> {
        if self.is_match_all() {
            return Some(tiers::ANNOUNCEMENT_CONTAINS);
        }
        if self.starts(&announcement.text) {
            return Some(tiers::ANNOUNCEMENT_PREFIX);
        }
        if self.contains(&announcement.text) {
            return Some(tiers::ANNOUNCEMENT_CONTAINS);
        }
        None
    }
}
