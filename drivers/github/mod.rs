//! GitHub driver / GitHub驱动
//!
//! Pushes items as blobs and records all of them in a single commit.
//! 将文件作为blob上传，并在一次提交中记录

mod api;
mod driver;
mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PushError, Result};
use crate::storage::{DriverContext, DriverFactory, Service, Uploader};

pub use api::{buffered_blob_body, GithubApi};
pub use driver::GithubDriver;

/// GitHub driver options / GitHub驱动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Full repository name, e.g. "owner/repo" / 仓库全名
    pub repo: String,
    /// Branch the new tree is based on / 基础分支
    #[serde(default = "default_branch")]
    pub source: String,
    /// Branch receiving the commit, created from `source` if missing / 目标分支
    #[serde(default = "default_branch")]
    pub target: String,
    #[serde(default = "default_commit_msg")]
    pub commit_msg: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_commit_msg() -> String {
    "Pushed by cloudpush".to_string()
}

fn default_api_base() -> String {
    types::API_URL.to_string()
}

pub struct GithubDriverFactory;

impl DriverFactory for GithubDriverFactory {
    fn service(&self) -> Service {
        Service::Github
    }

    fn create_uploader(&self, token: &str, options: &Value, ctx: &DriverContext) -> Result<Uploader> {
        let config: GithubConfig = serde_json::from_value(options.clone())
            .map_err(|e| PushError::Config(format!("github: {}", e)))?;
        let driver = GithubDriver::new(config, token, ctx)?;
        Ok(Uploader::Batch(Box::new(driver)))
    }
}
