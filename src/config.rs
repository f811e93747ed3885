//! Application configuration module / 应用配置模块
//!
//! Loaded from config.json; a default file is created on first run.
//! 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PushError, Result};
use crate::storage::Service;
use crate::stream::DEFAULT_BLOCK_SIZE;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Only log errors / 仅输出错误日志
    #[serde(default)]
    pub silent: bool,
    /// Body streaming configuration / 请求体流配置
    #[serde(default)]
    pub stream: StreamConfig,
    /// HTTP client configuration / HTTP客户端配置
    #[serde(default)]
    pub http: HttpConfig,
    /// Where item sources may come from besides files and URLs / 额外的文件来源
    #[serde(default)]
    pub sources: SourceConfig,
    /// Push targets / 推送目标
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// Extra item sources / 额外的文件来源
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `s3:` sources, disabled when absent / S3来源（未配置时禁用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3SourceConfig>,
}

/// S3 bucket that `<prefix>:<key>` sources are read from / S3来源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3SourceConfig {
    pub bucket: String,
    /// Source prefix before the colon / 来源前缀
    #[serde(default = "default_s3_prefix")]
    pub prefix: String,
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint, empty for AWS / 自定义端点（AWS留空）
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: String,
    #[serde(default)]
    pub force_path_style: bool,
    /// Lifetime of presigned download URLs / 预签名URL有效期（秒）
    #[serde(default = "default_sign_url_expire")]
    pub sign_url_expire_secs: u32,
}

/// Body streaming configuration / 请求体流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Raw bytes transcoded per step, multiple of 3 / 每次转码的原始字节数（3的倍数）
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Items larger than this are streamed, smaller ones buffered / 超过此大小使用流式上传
    #[serde(default = "default_stream_threshold")]
    pub stream_threshold: u64,
}

/// HTTP client configuration / HTTP客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// One push target / 单个推送目标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub service: Service,
    #[serde(default)]
    pub token: String,
    /// Service specific options / 服务特有选项
    #[serde(default)]
    pub options: serde_json::Value,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_stream_threshold() -> u64 {
    1024 * 1024
}

fn default_s3_prefix() -> String {
    "s3".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_sign_url_expire() -> u32 {
    3600
}

fn default_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("cloudpush/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            stream_threshold: default_stream_threshold(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Check values the drivers rely on / 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.stream.block_size == 0 || self.stream.block_size % 3 != 0 {
            return Err(PushError::Config(format!(
                "stream.block_size must be a positive multiple of 3, got {}",
                self.stream.block_size
            )));
        }
        if let Some(s3) = &self.sources.s3 {
            if s3.bucket.is_empty() || s3.prefix.is_empty() {
                return Err(PushError::Config(
                    "sources.s3 needs a bucket and a prefix".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Default config file path / 默认配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PushError::Config(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| PushError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(path, &config)?;
        tracing::info!("Created default configuration at {:?}", path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .map_err(|e| PushError::Config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}
