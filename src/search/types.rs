//! Search result types / 搜索结果类型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Searchable entity kind / 可搜索实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    Student,
    Teacher,
    Assignment,
    Announcement,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Course,
        EntityKind::Student,
        EntityKind::Teacher,
        EntityKind::Assignment,
        EntityKind::Announcement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Student => "student",
            EntityKind::Teacher => "teacher",
            EntityKind::Assignment => "assignment",
            EntityKind::Announcement => "announcement",
        }
    }

    /// Whether one identity can show up in several courses / 是否需要去重
    pub fn needs_dedup(&self) -> bool {
        matches!(self, EntityKind::Student | EntityKind::Teacher)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course" | "courses" => Ok(EntityKind::Course),
            "student" | "students" => Ok(EntityKind::Student),
            "teacher" | "teachers" => Ok(EntityKind::Teacher),
            "assignment" | "assignments" | "coursework" | "course_work" => Ok(EntityKind::Assignment),
            "announcement" | "announcements" => Ok(EntityKind::Announcement),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// Course details / 课程附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Student / teacher details / 成员附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonMeta {
    pub course_id: String,
    pub course_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Assignment details / 作业附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMeta {
    pub course_id: String,
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ISO-8601 UTC timestamp / 截止时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Announcement details / 公告附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementMeta {
    pub course_id: String,
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Kind-specific metadata, tagged by kind / 按类型区分的附加信息
///
/// Serialized inline as `"kind": ..., "metadata": {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultMetadata {
    Course { metadata: CourseMeta },
    Student { metadata: PersonMeta },
    Teacher { metadata: PersonMeta },
    Assignment { metadata: AssignmentMeta },
    Announcement { metadata: AnnouncementMeta },
}

impl ResultMetadata {
    pub fn kind(&self) -> EntityKind {
        match self {
            ResultMetadata::Course { .. } => EntityKind::Course,
            ResultMetadata::Student { .. } => EntityKind::Student,
            ResultMetadata::Teacher { .. } => EntityKind::Teacher,
            ResultMetadata::Assignment { .. } => EntityKind::Assignment,
            ResultMetadata::Announcement { .. } => EntityKind::Announcement,
        }
    }

    /// Owning course id for nested kinds / 所属课程ID
    pub fn course_id(&self) -> Option<&str> {
        match self {
            ResultMetadata::Course { .. } => None,
            ResultMetadata::Student { metadata } | ResultMetadata::Teacher { metadata } => {
                Some(&metadata.course_id)
            }
            ResultMetadata::Assignment { metadata } => Some(&metadata.course_id),
            ResultMetadata::Announcement { metadata } => Some(&metadata.course_id),
        }
    }
}

/// One matched record / 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub metadata: ResultMetadata,
    pub relevance: f64,
}

impl SearchResult {
    /// Relevance is clamped into [0, 1] / 相关度限制在 [0, 1]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        metadata: ResultMetadata,
        relevance: f64,
    ) -> Self {
        let relevance = if relevance.is_nan() { 0.0 } else { relevance.clamp(0.0, 1.0) };
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            metadata,
            relevance,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.metadata.kind()
    }
}

/// Ranked page plus match count; the unit stored in the cache / 搜索响应（缓存单元）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSearchResponse {
    pub results: Vec<SearchResult>,
    /// Matches before pagination / 分页前匹配总数
    pub total: usize,
}
