//! Dropbox driver / Dropbox驱动
//!
//! Uploads one item per request up to `chunk_size`, larger items through an
//! upload session. 小文件单次上传，大文件使用分块上传会话

mod api;
mod driver;
mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PushError, Result};
use crate::storage::{DriverContext, DriverFactory, Service, Uploader};

pub use api::api_arg;
pub use driver::DropboxDriver;

/// Largest body accepted by a single upload request / 单次上传请求的最大大小
const MAX_CHUNK_SIZE: u64 = 150 * 1024 * 1024;

/// Dropbox driver options / Dropbox驱动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxConfig {
    /// Items above this size use an upload session / 超过此大小使用分块上传
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_content_base")]
    pub content_base: String,
}

fn default_chunk_size() -> u64 {
    2 * 1024 * 1024
}

fn default_overwrite() -> bool {
    true
}

fn default_api_base() -> String {
    types::API_URL.to_string()
}

fn default_content_base() -> String {
    types::CONTENT_URL.to_string()
}

impl DropboxConfig {
    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(PushError::Config(format!(
                "dropbox: chunk_size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        Ok(())
    }
}

pub struct DropboxDriverFactory;

impl DriverFactory for DropboxDriverFactory {
    fn service(&self) -> Service {
        Service::Dropbox
    }

    fn create_uploader(&self, token: &str, options: &Value, ctx: &DriverContext) -> Result<Uploader> {
        if token.is_empty() {
            return Err(PushError::Config("dropbox: token is required".to_string()));
        }
        let config: DropboxConfig = serde_json::from_value(options.clone())
            .map_err(|e| PushError::Config(format!("dropbox: {}", e)))?;
        config.validate()?;
        let driver = DropboxDriver::new(config, token, ctx)?;
        Ok(Uploader::PerItem(Box::new(driver)))
    }
}
