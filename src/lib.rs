pub mod cache;
pub mod config;
pub mod models;
pub mod provider;
pub mod search;

// Provider implementations (point to project root providers via path attribute) / 数据源实现
#[path = "../providers/mod.rs"]
pub mod providers;
