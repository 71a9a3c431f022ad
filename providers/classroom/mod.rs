//! Google Classroom 数据源
//!
//! 通过 REST API 列出课程、学生、教师、作业与公告
//! 支持 access_token 直接访问，或 refresh_token 在线刷新

mod client;
mod types;

pub use client::ClassroomProvider;
