//! Dropbox HTTP client / Dropbox HTTP客户端

use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::types::*;
use crate::config::HttpConfig;
use crate::error::{PushError, Result};

/// Header carrying the JSON argument of content endpoints / 内容接口的参数头
const API_ARG_HEADER: &str = "Dropbox-API-Arg";

pub struct DropboxApi {
    client: Client,
    api_base: String,
    content_base: String,
    token: String,
}

impl DropboxApi {
    pub fn new(token: &str, api_base: &str, content_base: &str, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            content_base: content_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// JSON RPC endpoint / RPC接口
    fn rpc<T: Serialize>(&self, endpoint: &str, arg: &T) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.api_base, endpoint))
            .bearer_auth(&self.token)
            .json(arg)
    }

    /// Content upload endpoint, argument in header and raw bytes in body
    /// 内容上传接口：参数放在请求头，请求体为原始字节
    fn content<T: Serialize>(&self, endpoint: &str, arg: &T, data: Vec<u8>) -> Result<RequestBuilder> {
        Ok(self
            .client
            .post(format!("{}/{}", self.content_base, endpoint))
            .bearer_auth(&self.token)
            .header(API_ARG_HEADER, api_arg(arg)?)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data))
    }

    /// Response text of a successful call / 成功调用的响应文本
    async fn check(resp: Response) -> Result<String> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error_summary)
                .unwrap_or(text);
            return Err(PushError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(text)
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let text = Self::check(resp).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Single request upload / 单次上传
    pub async fn upload(&self, commit: &CommitInfo<'_>, data: Vec<u8>) -> Result<FileMetadata> {
        let resp = self.content("files/upload", commit, data)?.send().await?;
        Self::parse(resp).await
    }

    /// Open an upload session with the first chunk / 以第一块数据开启上传会话
    pub async fn start_session(&self, data: Vec<u8>) -> Result<String> {
        let arg = SessionStartArg { close: false };
        let resp = self
            .content("files/upload_session/start", &arg, data)?
            .send()
            .await?;
        let started: SessionStartResult = Self::parse(resp).await?;
        Ok(started.session_id)
    }

    pub async fn append(&self, session_id: &str, offset: u64, data: Vec<u8>) -> Result<()> {
        let arg = SessionAppendArg {
            cursor: UploadSessionCursor { session_id, offset },
            close: false,
        };
        let resp = self
            .content("files/upload_session/append_v2", &arg, data)?
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Commit the session; `offset` is the total uploaded size / 提交会话
    pub async fn finish(&self, session_id: &str, offset: u64, commit: &CommitInfo<'_>) -> Result<FileMetadata> {
        let arg = SessionFinishArg {
            cursor: UploadSessionCursor { session_id, offset },
            commit,
        };
        let resp = self
            .content("files/upload_session/finish", &arg, Vec::new())?
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// First page of a folder listing ("" is the root) / 列出目录第一页（根目录为空字符串）
    pub async fn list_folder(&self, path: &str) -> Result<ListFolderResult> {
        let resp = self.rpc("files/list_folder", &PathArg { path }).send().await?;
        Self::parse(resp).await
    }

    pub async fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult> {
        let resp = self
            .rpc("files/list_folder/continue", &ListFolderContinueArg { cursor })
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.rpc("files/delete_v2", &PathArg { path }).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// Serialize a header argument, escaping everything outside ASCII
/// 序列化请求头参数，非ASCII字符转义为 `\uXXXX`
pub fn api_arg<T: Serialize>(arg: &T) -> Result<String> {
    let json = serde_json::to_string(arg)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}
