//! GitHub HTTP client / GitHub HTTP客户端

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::types::*;
use crate::config::HttpConfig;
use crate::error::{PushError, Result};
use crate::stream::SegmentedStream;

/// Bytes handed to the HTTP body per poll / 每次交给HTTP请求体的字节数
const BODY_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the blocking reader and the request / 读取线程与请求之间的缓冲块数
const BODY_CHANNEL_CAPACITY: usize = 4;

/// Git data API client for one repository / 单仓库git数据API客户端
pub struct GithubApi {
    client: Client,
    api_base: String,
    repo: String,
    token: String,
}

impl GithubApi {
    pub fn new(repo: &str, token: &str, api_base: &str, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/repos/{}/{}", self.api_base, self.repo, path);
        let mut req = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if !self.token.is_empty() {
            req = req.header(header::AUTHORIZATION, format!("token {}", self.token));
        }
        req
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(PushError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Head commit of a branch / 分支最新提交
    pub async fn branch(&self, name: &str) -> Result<BranchCommit> {
        let resp = self.request(Method::GET, &format!("branches/{}", name)).send().await?;
        let branch: BranchResponse = Self::parse(resp).await?;
        Ok(branch.commit)
    }

    /// Create `refs/heads/{branch}` at `sha` / 创建分支引用
    pub async fn create_ref(&self, branch: &str, sha: &str) -> Result<String> {
        let body = CreateRefRequest {
            git_ref: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        };
        let resp = self.request(Method::POST, "git/refs").json(&body).send().await?;
        let created: RefResponse = Self::parse(resp).await?;
        Ok(created.object.sha)
    }

    /// Move `refs/heads/{branch}` to `sha` / 更新分支引用
    pub async fn update_ref(&self, branch: &str, sha: &str) -> Result<()> {
        let body = UpdateRefRequest { sha, force: false };
        let resp = self
            .request(Method::PATCH, &format!("git/refs/heads/{}", branch))
            .json(&body)
            .send()
            .await?;
        let _: RefResponse = Self::parse(resp).await?;
        Ok(())
    }

    /// Create a blob from an in-memory body / 内存中构建请求体创建blob
    pub async fn create_blob(&self, data: &[u8]) -> Result<String> {
        let body = buffered_blob_body(data)?;
        let resp = self
            .request(Method::POST, "git/blobs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let blob: ShaResponse = Self::parse(resp).await?;
        Ok(blob.sha)
    }

    /// Create a blob from a streamed JSON body with exact `Content-Length`
    /// 以流式JSON请求体创建blob（预先设置Content-Length）
    pub async fn stream_blob(&self, body: SegmentedStream) -> Result<String> {
        let length = body.total_size();
        let resp = self
            .request(Method::POST, "git/blobs")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, length)
            .body(channel_body(body))
            .send()
            .await?;
        let blob: ShaResponse = Self::parse(resp).await?;
        Ok(blob.sha)
    }

    /// Create a tree on top of `base_tree` / 基于已有tree创建新tree
    pub async fn create_tree(&self, base_tree: &str, entries: Vec<TreeEntryRequest<'_>>) -> Result<String> {
        let body = TreeRequest {
            base_tree,
            tree: entries,
        };
        let resp = self.request(Method::POST, "git/trees").json(&body).send().await?;
        let tree: ShaResponse = Self::parse(resp).await?;
        Ok(tree.sha)
    }

    pub async fn create_commit(&self, message: &str, tree: &str, parent: &str) -> Result<String> {
        let body = CommitRequest {
            message,
            tree,
            parents: vec![parent],
        };
        let resp = self.request(Method::POST, "git/commits").json(&body).send().await?;
        let commit: ShaResponse = Self::parse(resp).await?;
        Ok(commit.sha)
    }

    /// Fetch a tree, optionally recursive / 获取tree
    pub async fn tree(&self, sha: &str, recursive: bool) -> Result<TreeResponse> {
        let mut req = self.request(Method::GET, &format!("git/trees/{}", sha));
        if recursive {
            req = req.query(&[("recursive", "1")]);
        }
        let resp = req.send().await?;
        Self::parse(resp).await
    }
}

/// Request body fed from the blocking pool through a bounded channel
/// 在阻塞线程池中读取，经有界通道交给请求体
fn channel_body(body: SegmentedStream) -> reqwest::Body {
    let (tx, rx) = mpsc::channel::<std::io::Result<Bytes>>(BODY_CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || {
        for chunk in body.chunks(BODY_CHUNK_SIZE) {
            if tx.blocking_send(chunk).is_err() {
                tracing::debug!("Request body dropped before the stream ended");
                break;
            }
        }
    });
    reqwest::Body::wrap_stream(ReceiverStream::new(rx))
}

/// Buffered `{"content":"<base64>","encoding":"base64"}` body / 缓冲方式构建blob请求体
pub fn buffered_blob_body(data: &[u8]) -> Result<Vec<u8>> {
    let encoded = BASE64.encode(data);
    let body = BlobRequest {
        content: &encoded,
        encoding: "base64",
    };
    Ok(serde_json::to_vec(&body)?)
}
