//! Local folder driver / 本地目录驱动
//!
//! Copies each item into a directory on disk. Useful as a mirror target and
//! for exercising the push pipeline without a remote service.

mod driver;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{PushError, Result};
use crate::storage::{DriverContext, DriverFactory, Service, Uploader};

pub use driver::LocalDriver;

/// Local driver options / 本地驱动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root directory on disk / 磁盘根目录
    pub root: String,
}

pub struct LocalDriverFactory;

impl DriverFactory for LocalDriverFactory {
    fn service(&self) -> Service {
        Service::Local
    }

    fn create_uploader(&self, _token: &str, options: &Value, _ctx: &DriverContext) -> Result<Uploader> {
        let config: LocalConfig = serde_json::from_value(options.clone())
            .map_err(|e| PushError::Config(format!("local: {}", e)))?;
        Ok(Uploader::PerItem(Box::new(LocalDriver::new(PathBuf::from(config.root)))))
    }
}
