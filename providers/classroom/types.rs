//! Classroom API 分页响应

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::{Announcement, Course, CourseMember, CourseWork};

/// 分页列表响应
pub trait PagedResponse: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

/// Token刷新响应
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub expires_in: Option<u64>,
}

/// Token错误
#[derive(Debug, Deserialize)]
pub struct TokenError {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursesPage {
    #[serde(default)]
    courses: Vec<Course>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentsPage {
    #[serde(default)]
    students: Vec<CourseMember>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachersPage {
    #[serde(default)]
    teachers: Vec<CourseMember>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWorkPage {
    #[serde(default)]
    course_work: Vec<CourseWork>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementsPage {
    #[serde(default)]
    announcements: Vec<Announcement>,
    next_page_token: Option<String>,
}

impl PagedResponse for CoursesPage {
    type Item = Course;
    fn into_parts(self) -> (Vec<Course>, Option<String>) {
        (self.courses, self.next_page_token)
    }
}

impl PagedResponse for StudentsPage {
    type Item = CourseMember;
    fn into_parts(self) -> (Vec<CourseMember>, Option<String>) {
        (self.students, self.next_page_token)
    }
}

impl PagedResponse for TeachersPage {
    type Item = CourseMember;
    fn into_parts(self) -> (Vec<CourseMember>, Option<String>) {
        (self.teachers, self.next_page_token)
    }
}

impl PagedResponse for CourseWorkPage {
    type Item = CourseWork;
    fn into_parts(self) -> (Vec<CourseWork>, Option<String>) {
        (self.course_work, self.next_page_token)
    }
}

impl PagedResponse for AnnouncementsPage {
    type Item = Announcement;
    fn into_parts(self) -> (Vec<Announcement>, Option<String>) {
        (self.announcements, self.next_page_token)
    }
}
