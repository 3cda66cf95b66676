//! 统一配置中心
//!
//! 提供协作服务的全局配置管理，包括：
//! - 服务监听地址
//! - 消息队列刷新策略
//! - 房间文档默认内容
//!
//! 加载优先级：默认值 -> 配置文件 -> 环境变量。

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 显式指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SERVER_CONFIG_PATH";

/// 嵌套环境变量前缀，例如 `COLLAB_MESSAGE_QUEUE__THRESHOLD`
pub const ENV_PREFIX: &str = "COLLAB_";

/// 未指定路径时依次查找的配置文件
const DEFAULT_LOCATIONS: &[&str] = &[
    "config.yaml",
    "config.yml",
    "config.json",
    "config.toml",
    "server/config.yaml",
    "server/config.yml",
    "server/config.json",
    "server/config.toml",
];

/// 兼容旧部署脚本的扁平环境变量
const LEGACY_ENV: &[(&str, &str)] = &[
    ("MESSAGE_QUEUE_THRESHOLD", "message_queue.threshold"),
    ("MESSAGE_QUEUE_SLEEP_DURATION", "message_queue.sleep_duration"),
    (
        "MESSAGE_QUEUE_ERROR_SLEEP_DURATION",
        "message_queue.error_sleep_duration",
    ),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
];

const DEFAULT_DOCUMENT_CONTENT: &str =
    "def main():\n    print('Hello, world!')\nif __name__ == '__main__':\n    main()";

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 消息队列配置
    #[serde(default)]
    pub message_queue: MessageQueueConfig,
    /// 房间配置
    #[serde(default)]
    pub room: RoomConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 消息队列配置（时间单位：秒）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageQueueConfig {
    /// 待发送消息达到该数量时立即刷新
    pub threshold: usize,
    /// 未达到阈值时的轮询间隔
    pub sleep_duration: f64,
    /// 刷新异常后的退避间隔
    pub error_sleep_duration: f64,
}

/// 房间配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomConfig {
    /// 文档为空时用于初始化的内容
    pub default_document_content: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for MessageQueueConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            sleep_duration: 0.2,
            error_sleep_duration: 1.0,
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            default_document_content: DEFAULT_DOCUMENT_CONTENT.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            message_queue: MessageQueueConfig::default(),
            room: RoomConfig::default(),
        }
    }
}

impl MessageQueueConfig {
    pub fn sleep(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_duration)
    }

    pub fn error_sleep(&self) -> Duration {
        Duration::from_secs_f64(self.error_sleep_duration)
    }
}

impl ServerConfig {
    /// 监听地址，形如 `0.0.0.0:8000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// 按 默认值 -> 配置文件 -> 环境变量 的顺序加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment().extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 组装配置来源，便于调用方追加自己的 provider
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(path) = Self::config_file_path() {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        figment
            .merge(Env::raw().filter_map(legacy_env_key))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 解析配置文件路径：环境变量优先，否则查找默认位置
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        DEFAULT_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.message_queue.threshold == 0 {
            return Err(ConfigError::InvalidMessageQueueConfig(
                "threshold must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("sleep_duration", self.message_queue.sleep_duration),
            ("error_sleep_duration", self.message_queue.error_sleep_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidMessageQueueConfig(format!(
                    "{name} must be a positive number of seconds"
                )));
            }
        }

        Ok(())
    }
}

fn legacy_env_key(key: &UncasedStr) -> Option<Uncased<'_>> {
    LEGACY_ENV
        .iter()
        .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
        .map(|(_, path)| Uncased::from(*path))
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid message queue configuration: {0}")]
    InvalidMessageQueueConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load_in_jail() -> figment::error::Result<AppConfig> {
        AppConfig::load().map_err(|err| figment::Error::from(err.to_string()))
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.message_queue.threshold, 1);
        assert_eq!(config.message_queue.sleep().as_millis(), 200);
        assert_eq!(config.message_queue.error_sleep(), Duration::from_secs(1));
        assert!(config
            .room
            .default_document_content
            .starts_with("def main():"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_in_jail()?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_in_default_location() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
message_queue:
  threshold: 5
  sleep_duration: 0.5
room:
  default_document_content: "hello"
"#,
            )?;

            let config = load_in_jail()?;
            assert_eq!(config.message_queue.threshold, 5);
            assert_eq!(config.message_queue.sleep_duration, 0.5);
            assert_eq!(config.message_queue.error_sleep_duration, 1.0);
            assert_eq!(config.room.default_document_content, "hello");
            assert_eq!(config.server.port, 8000);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path_takes_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "server:\n  port: 9000\n")?;
            jail.create_file("custom.json", r#"{"server": {"host": "127.0.0.1", "port": 9100}}"#)?;
            jail.set_env(CONFIG_PATH_ENV, "custom.json");

            let config = load_in_jail()?;
            assert_eq!(config.server.bind_addr(), "127.0.0.1:9100");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[message_queue]\nthreshold = 3\n")?;
            jail.set_env("MESSAGE_QUEUE_THRESHOLD", "7");
            jail.set_env("SERVER_PORT", "8100");
            jail.set_env("COLLAB_MESSAGE_QUEUE__ERROR_SLEEP_DURATION", "2.5");

            let config = load_in_jail()?;
            assert_eq!(config.message_queue.threshold, 7);
            assert_eq!(config.server.port, 8100);
            assert_eq!(config.message_queue.error_sleep_duration, 2.5);
            Ok(())
        });
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("MESSAGE_QUEUE_THRESHOLD", "0");

            let result = AppConfig::load();
            assert!(matches!(
                result,
                Err(ConfigError::InvalidMessageQueueConfig(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.message_queue.sleep_duration = 0.0;
        assert!(config.validate().is_err());

        config.message_queue.sleep_duration = f64::NAN;
        assert!(config.validate().is_err());

        config.message_queue.sleep_duration = 0.1;
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());

        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        assert!(config.validate().is_err());

        config.server.port = 8000;
        assert!(config.validate().is_ok());
    }
}
