//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//!
//! The loaded [`AppConfig`] is handed to each component by `main`;
//! there is no process-wide config instance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location / 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "CLASSROOM_SEARCH_CONFIG";

/// Largest page size accepted by the course listing endpoint / 课程列表最大分页
pub const MAX_COURSE_PAGE_SIZE: u32 = 100;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Classroom provider configuration / 课堂服务配置
    #[serde(default)]
    pub classroom: ClassroomConfig,
    /// Search configuration / 搜索配置
    #[serde(default)]
    pub search: SearchConfig,
    /// Result cache configuration / 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Classroom provider configuration / 课堂服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomConfig {
    /// REST API root / API 根地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// OAuth token endpoint / 令牌刷新地址
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Static access token (optional when a refresh token is set) / 访问令牌
    #[serde(default)]
    pub access_token: String,
    /// Refresh token / 刷新令牌
    #[serde(default)]
    pub refresh_token: String,
    /// OAuth client id / 客户端ID
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret / 客户端密钥
    #[serde(default)]
    pub client_secret: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size for the course listing (clamped to 1..=100) / 课程分页大小
    #[serde(default = "default_course_page_size")]
    pub course_page_size: u32,
    /// Per-course fetches in flight / 并发拉取课程子集合数量
    #[serde(default = "default_course_concurrency")]
    pub course_concurrency: usize,
    /// Deadline for one search call (seconds) / 单次搜索超时
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Result cache configuration / 缓存配置
///
/// Entry TTL is fixed and intentionally absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached responses / 最大缓存条目数
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Expired entry purge interval (seconds) / 过期清理间隔
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_base_url() -> String { "https://classroom.googleapis.com/v1".to_string() }
fn default_token_url() -> String { "https://oauth2.googleapis.com/token".to_string() }
fn default_course_page_size() -> u32 { MAX_COURSE_PAGE_SIZE }
fn default_course_concurrency() -> usize { 4 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_entries() -> usize { 10_000 }
fn default_purge_interval() -> u64 { 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8180,
        }
    }
}

impl Default for ClassroomConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            access_token: String::new(),
            refresh_token: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            course_page_size: default_course_page_size(),
            course_concurrency: default_course_concurrency(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl ClassroomConfig {
    /// Whether a refresh flow is possible / 是否可以刷新令牌
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
    }

    /// Whether enough credentials exist to build a provider / 是否已配置凭据
    pub fn has_credentials(&self) -> bool {
        !self.access_token.is_empty() || self.can_refresh()
    }
}

impl SearchConfig {
    /// Course page size clamped to what the API accepts / 规范化后的分页大小
    pub fn effective_page_size(&self) -> u32 {
        self.course_page_size.clamp(1, MAX_COURSE_PAGE_SIZE)
    }

    pub fn effective_concurrency(&self) -> usize {
        self.course_concurrency.max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl CacheConfig {
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "classroom-search-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server":{"host":"127.0.0.1","port":9000}}"#).unwrap();
        assert_eq!(config.get_bind_address(), "127.0.0.1:9000");
        assert_eq!(config.search.course_page_size, 100);
        assert_eq!(config.search.course_concurrency, 4);
        assert_eq!(config.classroom.base_url, "https://classroom.googleapis.com/v1");
        assert!(!config.classroom.has_credentials());
    }

    #[test]
    fn test_search_limits_are_clamped() {
        let search = SearchConfig {
            course_page_size: 500,
            course_concurrency: 0,
            request_timeout_secs: 0,
        };
        assert_eq!(search.effective_page_size(), 100);
        assert_eq!(search.effective_concurrency(), 1);
        assert_eq!(search.request_timeout(), Duration::from_secs(1));

        let search = SearchConfig { course_page_size: 0, ..SearchConfig::default() };
        assert_eq!(search.effective_page_size(), 1);
    }

    #[test]
    fn test_credentials() {
        let mut classroom = ClassroomConfig::default();
        classroom.refresh_token = "r".to_string();
        assert!(!classroom.has_credentials());
        classroom.client_id = "id".to_string();
        classroom.client_secret = "secret".to_string();
        assert!(classroom.can_refresh());
        assert!(classroom.has_credentials());

        let classroom = ClassroomConfig { access_token: "t".to_string(), ..ClassroomConfig::default() };
        assert!(classroom.has_credentials());
        assert!(!classroom.can_refresh());
    }

    #[test]
    fn test_load_creates_default_then_reads_back() {
        let path = temp_config_path("load");
        let _ = std::fs::remove_file(&path);

        let created = load_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.server.port, 8180);

        let mut changed = created.clone();
        changed.search.course_concurrency = 8;
        save_config(&path, &changed).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.search.course_concurrency, 8);
        let _ = std::fs::remove_file(&path);
    }
}
