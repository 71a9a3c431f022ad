//! Provider data model / 课堂服务数据模型
//!
//! Mirrors the JSON returned by the classroom REST API (camelCase fields).
//! Every field except the identifier is optional on the wire.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Course / 课程
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}

/// Person name / 姓名
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub full_name: String,
}

/// User profile / 用户资料
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to given + family name / 显示名称
    pub fn display_name(&self) -> String {
        if !self.name.full_name.is_empty() {
            return self.name.full_name.clone();
        }
        format!("{} {}", self.name.given_name, self.name.family_name)
            .trim()
            .to_string()
    }
}

/// Course roster entry (student or teacher) / 课程成员
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMember {
    #[serde(default)]
    pub course_id: String,
    pub user_id: String,
    #[serde(default)]
    pub profile: UserProfile,
}

pub type Student = CourseMember;
pub type Teacher = CourseMember;

/// Calendar date / 日期
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Time of day / 时间
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeOfDay {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

/// Course work (assignment) / 课程作业
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWork {
    #[serde(default)]
    pub course_id: String,
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}

impl CourseWork {
    /// Due date as an ISO-8601 UTC timestamp / 截止时间 (ISO-8601)
    ///
    /// Missing time of day means midnight. Invalid dates yield `None`.
    pub fn due_timestamp(&self) -> Option<String> {
        let date = self.due_date?;
        let date = NaiveDate::from_ymd_opt(date.year, date.month, date.day)?;
        let time = match self.due_time {
            Some(t) => NaiveTime::from_hms_opt(t.hours, t.minutes, t.seconds)?,
            None => NaiveTime::MIN,
        };
        Some(date.and_time(time).and_utc().format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }
}

/// Announcement / 公告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(default)]
    pub course_id: String,
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}
