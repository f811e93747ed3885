//! GitHub git data API types / GitHub git数据API类型

use serde::{Deserialize, Serialize};

pub const API_URL: &str = "https://api.github.com";

/// Blob creation body (buffered form) / blob创建请求体
#[derive(Debug, Serialize)]
pub struct BlobRequest<'a> {
    pub content: &'a str,
    pub encoding: &'a str,
}

/// Any response carrying a sha / 带sha的响应
#[derive(Debug, Clone, Deserialize)]
pub struct ShaResponse {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct BranchResponse {
    pub commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub tree: ShaResponse,
}

#[derive(Debug, Serialize)]
pub struct TreeRequest<'a> {
    pub base_tree: &'a str,
    pub tree: Vec<TreeEntryRequest<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TreeEntryRequest<'a> {
    pub path: &'a str,
    pub mode: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefResponse {
    pub object: ShaResponse,
}

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Error body returned by the API / API错误响应
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
}
