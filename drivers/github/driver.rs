use async_trait::async_trait;

use super::api::GithubApi;
use super::types::{TreeEntryRequest, TreeItem};
use super::GithubConfig;
use crate::config::StreamConfig;
use crate::error::{PushError, Result};
use crate::models::Item;
use crate::storage::{BatchUploader, DriverContext, Entry, RemoteStore};
use crate::stream::json_blob_body_with_block_size;
use crate::utils::{base_name, join_path, parent_path, relative_path};

/// Regular file mode for tree entries / 普通文件模式
const BLOB_MODE: &str = "100644";

pub struct GithubDriver {
    api: GithubApi,
    config: GithubConfig,
    stream: StreamConfig,
}

impl GithubDriver {
    pub fn new(config: GithubConfig, token: &str, ctx: &DriverContext) -> Result<Self> {
        let api = GithubApi::new(&config.repo, token, &config.api_base, &ctx.http)?;
        Ok(Self {
            api,
            config,
            stream: ctx.stream.clone(),
        })
    }

    /// Upload one item as a blob, returns the blob sha / 上传单个文件为blob
    async fn push_blob(&self, mut item: Item) -> Result<String> {
        tracing::debug!("Uploading {} ({} bytes) to GitHub...", item.path(), item.size());
        let sha = if item.size() > self.stream.stream_threshold {
            tracing::debug!("Using JSON streaming...");
            let (_, content) = item.into_parts();
            let body = json_blob_body_with_block_size(content, self.stream.block_size)?;
            self.api.stream_blob(body).await?
        } else {
            let data = item.read_all()?;
            self.api.create_blob(&data).await?
        };
        tracing::debug!("Uploaded [{}]", sha);
        Ok(sha)
    }

    /// Target branch head, cloning the source branch if the target is missing
    /// 目标分支最新提交，不存在时从源分支创建
    async fn target_head(&self) -> Result<String> {
        match self.api.branch(&self.config.target).await {
            Ok(commit) => Ok(commit.sha),
            Err(PushError::Remote { status: 404, .. }) => {
                let source = self.api.branch(&self.config.source).await?;
                tracing::info!("Creating branch {} from {}", self.config.target, self.config.source);
                self.api.create_ref(&self.config.target, &source.sha).await
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RemoteStore for GithubDriver {
    async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let head = self.api.branch(&self.config.source).await?;
        let tree = self.api.tree(&head.commit.tree.sha, true).await?;
        if tree.truncated {
            tracing::warn!("Tree listing for {} was truncated", self.api.repo());
        }
        direct_children(tree.tree, &relative_path(path))
    }

    async fn delete(&self, _path: &str) -> Result<()> {
        Err(PushError::Unsupported("Cannot delete from GitHub".to_string()))
    }
}

#[async_trait]
impl BatchUploader for GithubDriver {
    async fn push_all(&self, items: Vec<Item>, dir: &str) -> Result<Option<String>> {
        let head = self.api.branch(&self.config.source).await?;

        let mut blobs = Vec::with_capacity(items.len());
        for item in items {
            let path = relative_path(&join_path(dir, item.path()));
            let sha = self.push_blob(item).await?;
            blobs.push((path, sha));
        }

        let entries = blobs
            .iter()
            .map(|(path, sha)| TreeEntryRequest {
                path,
                mode: BLOB_MODE,
                kind: "blob",
                sha,
            })
            .collect();
        let tree = self.api.create_tree(&head.commit.tree.sha, entries).await?;

        let parent = self.target_head().await?;
        let commit = self.api.create_commit(&self.config.commit_msg, &tree, &parent).await?;
        self.api.update_ref(&self.config.target, &commit).await?;
        tracing::info!("Committed {} to {}:{}", commit, self.api.repo(), self.config.target);
        Ok(Some(commit))
    }
}

/// Entries directly under `remote` (relative, "" for root) / 目录的直接子项
fn direct_children(tree: Vec<TreeItem>, remote: &str) -> Result<Vec<Entry>> {
    if !remote.is_empty() && !tree.iter().any(|t| t.path == remote && t.kind == "tree") {
        return Err(PushError::Remote {
            status: 404,
            message: format!("Invalid GitHub path specified: {}", remote),
        });
    }

    Ok(tree
        .into_iter()
        .filter(|t| parent_path(&t.path) == remote)
        .map(|t| Entry {
            name: base_name(&t.path).to_string(),
            path: format!("/{}", t.path),
            is_dir: t.kind == "tree",
            size: t.size,
            sha: Some(t.sha),
        })
        .collect())
}
