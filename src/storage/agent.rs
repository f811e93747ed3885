//! Push agent / 推送代理

use parking_lot::RwLock;
use uuid::Uuid;

use super::{Entry, Service, Uploader};
use crate::config::SourceConfig;
use crate::error::Result;
use crate::models::{Item, ItemEntry};
use crate::utils::{fix_and_clean_path, join_path};

/// Result of one push / 推送结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub items: usize,
    /// Revision created by batch services / 批量服务生成的版本
    pub revision: Option<String>,
}

/// One configured push target / 单个推送目标
pub struct Agent {
    id: Uuid,
    service: Service,
    /// Remote target directory / 远程目标目录
    dir: RwLock<String>,
    uploader: Uploader,
    sources: SourceConfig,
}

impl Agent {
    pub fn new(service: Service, dir: &str, uploader: Uploader) -> Self {
        Self {
            id: Uuid::new_v4(),
            service,
            dir: RwLock::new(fix_and_clean_path(dir)),
            uploader,
            sources: SourceConfig::default(),
        }
    }

    /// Extra item sources used by `push` / 推送时可用的额外来源
    pub fn with_sources(mut self, sources: SourceConfig) -> Self {
        self.sources = sources;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn name(&self) -> &'static str {
        self.service.display_name()
    }

    pub fn dir(&self) -> String {
        self.dir.read().clone()
    }

    pub fn set_dir(&self, path: &str) {
        *self.dir.write() = fix_and_clean_path(path);
    }

    /// Open entries and push them / 打开条目并推送
    pub async fn push(&self, entries: &[ItemEntry]) -> Result<PushOutcome> {
        let items = Item::open_with(entries, &self.sources).await?;
        self.push_items(items).await
    }

    /// Push already opened items / 推送已打开的条目
    pub async fn push_items(&self, mut items: Vec<Item>) -> Result<PushOutcome> {
        for item in &mut items {
            item.rewind()?;
        }
        let count = items.len();
        let dir = self.dir();
        tracing::info!("Pushing {} items to {}", count, self.name());

        let revision = match &self.uploader {
            Uploader::Batch(uploader) => uploader.push_all(items, &dir).await?,
            Uploader::PerItem(uploader) => {
                for item in items {
                    uploader.push_item(item, &dir).await?;
                }
                None
            }
        };

        tracing::info!("Push to {} completed", self.name());
        Ok(PushOutcome { items: count, revision })
    }

    /// Push a single item / 推送单个文件
    ///
    /// Batch services commit it on its own, which is rarely what callers want.
    pub async fn push_item(&self, mut item: Item) -> Result<PushOutcome> {
        item.rewind()?;
        let dir = self.dir();
        let revision = match &self.uploader {
            Uploader::Batch(uploader) => {
                tracing::warn!("push_item should not be used for {}", self.name());
                uploader.push_all(vec![item], &dir).await?
            }
            Uploader::PerItem(uploader) => {
                uploader.push_item(item, &dir).await?;
                None
            }
        };
        Ok(PushOutcome { items: 1, revision })
    }

    /// List entries at `path` (relative to the remote directory), or the remote directory itself
    /// 列出远程目录内容
    pub async fn list(&self, path: Option<&str>) -> Result<Vec<Entry>> {
        let dir = self.dir();
        let target = match path {
            Some(path) => join_path(&dir, path),
            None => dir,
        };
        self.uploader.list(&target).await
    }

    pub async fn files(&self, path: Option<&str>) -> Result<Vec<Entry>> {
        let entries = self.list(path).await?;
        Ok(entries.into_iter().filter(|e| !e.is_dir).collect())
    }

    pub async fn folders(&self, path: Option<&str>) -> Result<Vec<Entry>> {
        let entries = self.list(path).await?;
        Ok(entries.into_iter().filter(|e| e.is_dir).collect())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.uploader.delete(&join_path(&self.dir(), path)).await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("dir", &*self.dir.read())
            .field("batch", &self.uploader.is_batch())
            .finish()
    }
}
