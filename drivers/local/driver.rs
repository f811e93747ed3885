use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{PushError, Result};
use crate::models::Item;
use crate::storage::{Entry, ItemUploader, RemoteStore};
use crate::utils::{join_path, relative_path};

pub struct LocalDriver {
    root: PathBuf,
}

impl LocalDriver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a remote path under root; `..` cannot climb above it / 映射到根目录下的路径
    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(relative_path(path))
    }
}

#[async_trait]
impl RemoteStore for LocalDriver {
    async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let full_path = self.full_path(path);
        let mut entries = tokio::fs::read_dir(full_path).await?;
        let mut result = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = metadata.is_dir();

            result.push(Entry {
                path: join_path(path, &name),
                name,
                is_dir,
                size: (!is_dir).then(|| metadata.len()),
                sha: None,
            });
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(result)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        if tokio::fs::metadata(&full_path).await?.is_dir() {
            return Err(PushError::Unsupported(format!("{} is a directory", path)));
        }
        tokio::fs::remove_file(full_path).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemUploader for LocalDriver {
    async fn push_item(&self, item: Item, dir: &str) -> Result<()> {
        let target = self.full_path(&join_path(dir, item.path()));
        tracing::debug!("Copying {} ({} bytes) to {:?}", item.path(), item.size(), target);

        // Item content is a blocking reader / 内容为同步读取器
        let copied = tokio::task::spawn_blocking(move || {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let (_, mut content) = item.into_parts();
            let mut file = std::fs::File::create(&target)?;
            let copied = std::io::copy(&mut content, &mut file)?;
            file.sync_all()?;
            Ok::<u64, std::io::Error>(copied)
        })
        .await??;

        tracing::debug!("Copied {} bytes", copied);
        Ok(())
    }
}
