//! Dropbox API v2 types / Dropbox API v2 类型

use serde::{Deserialize, Serialize};

pub const API_URL: &str = "https://api.dropboxapi.com/2";
pub const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Where and how an upload is committed / 上传提交信息
#[derive(Debug, Serialize)]
pub struct CommitInfo<'a> {
    pub path: &'a str,
    /// "overwrite" or "add" / 覆盖或新增
    pub mode: &'a str,
    pub autorename: bool,
    pub mute: bool,
}

impl<'a> CommitInfo<'a> {
    pub fn new(path: &'a str, overwrite: bool) -> Self {
        Self {
            path,
            mode: if overwrite { "overwrite" } else { "add" },
            autorename: false,
            mute: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStartArg {
    pub close: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionStartResult {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadSessionCursor<'a> {
    pub session_id: &'a str,
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionAppendArg<'a> {
    pub cursor: UploadSessionCursor<'a>,
    pub close: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionFinishArg<'a> {
    pub cursor: UploadSessionCursor<'a>,
    pub commit: &'a CommitInfo<'a>,
}

#[derive(Debug, Serialize)]
pub struct PathArg<'a> {
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ListFolderContinueArg<'a> {
    pub cursor: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ListFolderResult {
    pub entries: Vec<Metadata>,
    pub cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

/// File, folder or deleted entry / 文件、文件夹或已删除条目
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum Metadata {
    File {
        name: String,
        #[serde(default)]
        path_display: Option<String>,
        size: u64,
        #[serde(default)]
        rev: Option<String>,
    },
    Folder {
        name: String,
        #[serde(default)]
        path_display: Option<String>,
    },
    Deleted {
        name: String,
    },
}

/// Metadata returned after an upload / 上传完成后的文件信息
#[derive(Debug, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Error body returned by the API / API错误响应
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error_summary: String,
}
