use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{HttpConfig, SourceConfig, StreamConfig};
use crate::error::{PushError, Result};
use crate::models::Item;

/// Supported services / 支持的服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Github,
    Dropbox,
    Local,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Github, Service::Dropbox, Service::Local];

    /// Stable numeric id, usable as a database key / 服务ID
    pub fn id(self) -> u32 {
        match self {
            Service::Github => 1,
            Service::Dropbox => 2,
            Service::Local => 100,
        }
    }

    pub fn from_id(id: u32) -> Option<Service> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Github => "github",
            Service::Dropbox => "dropbox",
            Service::Local => "local",
        }
    }

    /// Display name / 显示名称
    pub fn display_name(self) -> &'static str {
        match self {
            Service::Github => "GitHub",
            Service::Dropbox => "Dropbox",
            Service::Local => "Local Folder",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| PushError::InvalidService(s.to_string()))
    }
}

/// Remote file entry information / 远程文件条目信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Service revision id (e.g. git object sha) / 服务端版本标识
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Operations every service supports besides uploading / 通用远程操作
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List direct children of `path` / 列出目录内容
    async fn list(&self, path: &str) -> Result<Vec<Entry>>;

    /// Delete a file / 删除文件
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Services that push all items together, e.g. one commit / 批量推送的服务
#[async_trait]
pub trait BatchUploader: RemoteStore {
    /// Push items under `dir`; returns the resulting revision if any / 返回推送产生的版本
    async fn push_all(&self, items: Vec<Item>, dir: &str) -> Result<Option<String>>;
}

/// Services that take one item at a time / 逐个推送的服务
#[async_trait]
pub trait ItemUploader: RemoteStore {
    async fn push_item(&self, item: Item, dir: &str) -> Result<()>;
}

/// Upload capability, fixed when the driver is created / 上传能力（创建驱动时确定）
pub enum Uploader {
    Batch(Box<dyn BatchUploader>),
    PerItem(Box<dyn ItemUploader>),
}

impl Uploader {
    pub fn is_batch(&self) -> bool {
        matches!(self, Uploader::Batch(_))
    }

    pub async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        match self {
            Uploader::Batch(u) => u.list(path).await,
            Uploader::PerItem(u) => u.list(path).await,
        }
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        match self {
            Uploader::Batch(u) => u.delete(path).await,
            Uploader::PerItem(u) => u.delete(path).await,
        }
    }
}

/// Settings shared by all drivers / 驱动共享设置
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    pub stream: StreamConfig,
    pub http: HttpConfig,
    pub sources: SourceConfig,
}

pub mod agent;
pub mod manager;

pub use agent::{Agent, PushOutcome};
pub use manager::{AgentRegistry, DriverFactory};
