//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - HTTP 服务设置
//! - JWT认证
//! - 实时连接策略
//! - 密码哈希强度
//!
//! 加载顺序：默认值 -> `APP_CONFIG_FILE` 指定的文件 -> `APP_*` 环境变量（`__` 分隔嵌套字段）。

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    #[validate(nested)]
    pub security: SecurityConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// 为空或包含 `*` 时允许任意来源
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// JWT配置
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct JwtConfig {
    /// 至少 256 位
    #[validate(length(min = 32))]
    pub secret: String,
    #[validate(range(min = 1))]
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// 同一用户出现第二条连接时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 最后连接者成为可寻址目标
    #[default]
    Overwrite,
    /// 拒绝新连接，保留已有连接
    Reject,
}

/// 实时连接配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// 覆盖注册后是否主动关闭被取代的旧连接
    #[serde(default)]
    pub evict_superseded: bool,
}

/// 安全相关配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    #[validate(range(min = 4, max = 31))]
    pub bcrypt_cost: Option<u32>,
}

impl Default for AppConfig {
    /// 开发环境默认值，JWT 密钥必须在生产环境中覆盖
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
                cors_origins: Vec::new(),
            },
            jwt: JwtConfig {
                secret: "dev-secret-key-not-for-production-use-minimum-32-chars".into(),
                expiration_hours: 24 * 7,
            },
            realtime: RealtimeConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 构建带完整优先级链的 Figment
    pub fn figment() -> Figment {
        let mut fig = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("APP_").split("__"))
    }

    /// 从默认值、配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否仍在使用开发默认密钥
    pub fn uses_development_secret(&self) -> bool {
        self.jwt.secret.contains("dev-secret") || self.jwt.secret.contains("not-for-production")
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
