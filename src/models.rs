//! Items being pushed / 待推送的文件条目

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::SourceConfig;
use crate::error::{PushError, Result};
use crate::sources::{s3_key, S3Source};
use crate::stream::ByteSource;
use crate::utils::base_name;

/// File entry as given by the caller / 调用方给出的文件条目
///
/// Either a bare source (local path or URL) or a source with an explicit
/// remote path. Without a path, the remote path is the source's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemEntry {
    Source(String),
    Mapped { source: String, path: String },
}

impl ItemEntry {
    pub fn source(&self) -> &str {
        match self {
            ItemEntry::Source(source) => source,
            ItemEntry::Mapped { source, .. } => source,
        }
    }
}

impl From<&str> for ItemEntry {
    fn from(source: &str) -> Self {
        ItemEntry::Source(source.to_string())
    }
}

impl From<String> for ItemEntry {
    fn from(source: String) -> Self {
        ItemEntry::Source(source)
    }
}

/// A single file being pushed / 单个待推送文件
///
/// `path` is relative to the agent's remote directory.
pub struct Item {
    path: String,
    size: u64,
    content: Box<dyn ByteSource>,
}

impl Item {
    /// Wrap `content`, measuring its size once and rewinding it / 包装内容并测量大小
    pub fn new<S: ByteSource + 'static>(path: impl Into<String>, content: S) -> Result<Self> {
        let mut content: Box<dyn ByteSource> = Box::new(content);
        let size = content.seek(SeekFrom::End(0))?;
        content.rewind()?;
        Ok(Self {
            path: path.into(),
            size,
            content,
        })
    }

    pub fn from_bytes(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::new(path, Cursor::new(data.into()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.content.rewind()?;
        Ok(())
    }

    /// Read the whole content from the start / 从头读取全部内容
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        self.content.rewind()?;
        let mut data = Vec::with_capacity(self.size as usize);
        self.content.read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn into_parts(self) -> (String, Box<dyn ByteSource>) {
        (self.path, self.content)
    }

    /// Open every entry from files and URLs only / 打开全部条目（仅本地文件与URL）
    pub async fn open(entries: &[ItemEntry]) -> Result<Vec<Item>> {
        Self::open_with(entries, &SourceConfig::default()).await
    }

    /// Open every entry, resolving configured extra sources / 打开全部条目
    pub async fn open_with(entries: &[ItemEntry], sources: &SourceConfig) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            items.push(Self::open_single_with(entry, sources).await?);
        }
        Ok(items)
    }

    /// Open one entry / 打开单个条目
    pub async fn open_single(entry: &ItemEntry) -> Result<Item> {
        Self::open_single_with(entry, &SourceConfig::default()).await
    }

    pub async fn open_single_with(entry: &ItemEntry, sources: &SourceConfig) -> Result<Item> {
        let source = entry.source();
        let (content, default_name) = retrieve(source, sources).await?;
        let path = match entry {
            ItemEntry::Mapped { path, .. } => path.clone(),
            ItemEntry::Source(_) => default_name,
        };
        Item::new(path, content)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Retrieve content from a local file, an S3 object or an http(s) URL
/// 从本地文件、S3对象或URL获取内容
async fn retrieve(source: &str, sources: &SourceConfig) -> Result<(std::fs::File, String)> {
    if Path::new(source).is_file() {
        return retrieve_local(source);
    }

    if let Some(s3) = &sources.s3 {
        if let Some(key) = s3_key(source, &s3.prefix) {
            let url = S3Source::new(s3)?.presigned_url(key).await?;
            return retrieve_remote(url).await;
        }
    }

    let url = url::Url::parse(source)
        .map_err(|_| PushError::MissingContent(source.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PushError::MissingContent(source.to_string()));
    }
    retrieve_remote(url).await
}

fn retrieve_local(local_path: &str) -> Result<(std::fs::File, String)> {
    tracing::debug!("OPEN: {}", local_path);
    let file = std::fs::File::open(local_path)?;
    tracing::debug!("{} bytes", file.metadata()?.len());
    Ok((file, base_name(local_path).to_string()))
}

/// Download into an anonymous temp file / 下载到临时文件
async fn retrieve_remote(url: url::Url) -> Result<(std::fs::File, String)> {
    tracing::debug!("GET: {}", url);
    let name = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("download")
        .to_string();

    let mut response = reqwest::get(url.clone()).await?.error_for_status()?;
    let mut file = tempfile::tempfile()?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)?;
    }
    file.flush()?;
    let size = file.stream_position()?;
    file.rewind()?;
    tracing::debug!("Downloaded {} bytes", size);
    Ok((file, name))
}
