use async_trait::async_trait;
use std::io::Read;

use super::api::DropboxApi;
use super::types::{CommitInfo, Metadata};
use super::DropboxConfig;
use crate::error::{PushError, Result};
use crate::models::Item;
use crate::storage::{DriverContext, Entry, ItemUploader, RemoteStore};
use crate::stream::{ByteSource, StreamError};
use crate::utils::{fix_and_clean_path, join_path};

pub struct DropboxDriver {
    api: DropboxApi,
    config: DropboxConfig,
}

impl DropboxDriver {
    pub fn new(config: DropboxConfig, token: &str, ctx: &DriverContext) -> Result<Self> {
        let api = DropboxApi::new(token, &config.api_base, &config.content_base, &ctx.http)?;
        Ok(Self { api, config })
    }

    /// Upload through a session, one request per chunk / 分块上传会话
    async fn push_chunked(&self, mut content: Box<dyn ByteSource>, size: u64, commit: &CommitInfo<'_>) -> Result<()> {
        tracing::debug!("Using chunk uploader...");
        let mut session: Option<String> = None;
        let mut offset = 0u64;

        while offset < size {
            let want = (size - offset).min(self.config.chunk_size);
            let (rest, data) = read_block(content, want).await?;
            content = rest;
            if data.len() as u64 != want {
                return Err(StreamError::truncated(size, offset + data.len() as u64).into());
            }

            match &session {
                None => session = Some(self.api.start_session(data).await?),
                Some(id) => self.api.append(id, offset, data).await?,
            }
            offset += want;
            tracing::debug!("Uploaded {} bytes", offset);
        }

        let Some(id) = session else {
            return Err(PushError::MissingContent(commit.path.to_string()));
        };
        self.api.finish(&id, offset, commit).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for DropboxDriver {
    async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let remote = fix_and_clean_path(path);
        // The API names the root folder ""
        let folder = if remote == "/" { "" } else { remote.as_str() };

        let mut page = self.api.list_folder(folder).await.map_err(|e| match e {
            PushError::Remote { status: 409, .. } => PushError::Remote {
                status: 409,
                message: format!("Invalid Dropbox folder specified: {}", remote),
            },
            e => e,
        })?;

        let mut entries = Vec::new();
        loop {
            entries.extend(page.entries.into_iter().filter_map(|m| to_entry(m, &remote)));
            if !page.has_more {
                break;
            }
            page = self.api.list_folder_continue(&page.cursor).await?;
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let remote = fix_and_clean_path(path);
        self.api.delete(&remote).await?;
        tracing::info!("Deleted {} from Dropbox", remote);
        Ok(())
    }
}

#[async_trait]
impl ItemUploader for DropboxDriver {
    async fn push_item(&self, item: Item, dir: &str) -> Result<()> {
        let path = join_path(dir, item.path());
        let size = item.size();
        tracing::debug!("Uploading {} ({} bytes) to Dropbox...", item.path(), size);

        let commit = CommitInfo::new(&path, self.config.overwrite);
        let (_, content) = item.into_parts();
        if size > self.config.chunk_size {
            self.push_chunked(content, size, &commit).await?;
        } else {
            let (_, data) = read_block(content, size).await?;
            if data.len() as u64 != size {
                return Err(StreamError::truncated(size, data.len() as u64).into());
            }
            self.api.upload(&commit, data).await?;
        }
        tracing::debug!("Uploaded {}", path);
        Ok(())
    }
}

/// Read up to `len` bytes on the blocking pool / 在阻塞线程池中读取至多 `len` 字节
async fn read_block(content: Box<dyn ByteSource>, len: u64) -> Result<(Box<dyn ByteSource>, Vec<u8>)> {
    let block = tokio::task::spawn_blocking(move || {
        let mut content = content;
        let mut data = Vec::with_capacity(len as usize);
        content.by_ref().take(len).read_to_end(&mut data)?;
        Ok::<_, std::io::Error>((content, data))
    })
    .await??;
    Ok(block)
}

fn to_entry(meta: Metadata, dir: &str) -> Option<Entry> {
    match meta {
        Metadata::File { name, path_display, size, rev } => Some(Entry {
            path: path_display.unwrap_or_else(|| join_path(dir, &name)),
            name,
            is_dir: false,
            size: Some(size),
            sha: rev,
        }),
        Metadata::Folder { name, path_display } => Some(Entry {
            path: path_display.unwrap_or_else(|| join_path(dir, &name)),
            name,
            is_dir: true,
            size: None,
            sha: None,
        }),
        Metadata::Deleted { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorded, StubServer};
    use serde_json::{json, Value};

    const UPLOADED: &str = r#"{"name":"a.txt","path_display":"/docs/a.txt","size":5}"#;

    fn stub_driver(server: &StubServer, chunk_size: u64, overwrite: bool) -> DropboxDriver {
        let config = DropboxConfig {
            chunk_size,
            overwrite,
            api_base: server.url(),
            content_base: format!("{}/content", server.url()),
        };
        DropboxDriver::new(config, "tok", &DriverContext::default()).unwrap()
    }

    fn api_arg_of(req: &Recorded) -> Value {
        serde_json::from_str(req.header("dropbox-api-arg").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_small_item_single_upload() {
        let server = StubServer::json(200, UPLOADED).await;
        let driver = stub_driver(&server, 8, true);

        let item = Item::from_bytes("a.txt", b"hello".to_vec()).unwrap();
        driver.push_item(item, "/docs").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, "POST");
        assert_eq!(req.path(), "/content/files/upload");
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
        assert_eq!(req.header("content-type"), Some("application/octet-stream"));
        assert_eq!(req.body, b"hello");
        assert_eq!(
            api_arg_of(req),
            json!({ "path": "/docs/a.txt", "mode": "overwrite", "autorename": false, "mute": true })
        );
    }

    #[tokio::test]
    async fn test_item_at_chunk_size_is_not_chunked() {
        let server = StubServer::json(200, UPLOADED).await;
        let driver = stub_driver(&server, 5, false);

        let item = Item::from_bytes("a.txt", b"hello".to_vec()).unwrap();
        driver.push_item(item, "/").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path(), "/content/files/upload");
        assert_eq!(api_arg_of(&requests[0])["mode"], "add");
        assert_eq!(api_arg_of(&requests[0])["path"], "/a.txt");
    }

    #[tokio::test]
    async fn test_large_item_uses_upload_session() {
        let server = StubServer::start(|req| {
            let body = match req.path() {
                "/content/files/upload_session/start" => r#"{"session_id":"s1"}"#,
                "/content/files/upload_session/append_v2" => "null",
                "/content/files/upload_session/finish" => UPLOADED,
                _ => return (404, br#"{"error_summary":"not_found/"}"#.to_vec()),
            };
            (200, body.as_bytes().to_vec())
        })
        .await;
        let driver = stub_driver(&server, 4, true);

        let item = Item::from_bytes("big.bin", b"0123456789".to_vec()).unwrap();
        driver.push_item(item, "/docs").await.unwrap();

        let requests = server.requests();
        let paths: Vec<&str> = requests.iter().map(|r| r.path()).collect();
        assert_eq!(
            paths,
            vec![
                "/content/files/upload_session/start",
                "/content/files/upload_session/append_v2",
                "/content/files/upload_session/append_v2",
                "/content/files/upload_session/finish",
            ]
        );
        assert_eq!(requests[0].body, b"0123");
        assert_eq!(requests[1].body, b"4567");
        assert_eq!(requests[2].body, b"89");
        assert!(requests[3].body.is_empty());

        assert_eq!(api_arg_of(&requests[1])["cursor"], json!({ "session_id": "s1", "offset": 4 }));
        assert_eq!(api_arg_of(&requests[2])["cursor"]["offset"], 8);
        let finish = api_arg_of(&requests[3]);
        assert_eq!(finish["cursor"], json!({ "session_id": "s1", "offset": 10 }));
        assert_eq!(finish["commit"]["path"], "/docs/big.bin");
        assert_eq!(finish["commit"]["mode"], "overwrite");
    }

    #[tokio::test]
    async fn test_failed_chunk_stops_upload() {
        let server = StubServer::start(|req| match req.path() {
            "/content/files/upload_session/start" => (200, br#"{"session_id":"s1"}"#.to_vec()),
            _ => (
                409,
                br#"{"error_summary":"incorrect_offset/..","error":{}}"#.to_vec(),
            ),
        })
        .await;
        let driver = stub_driver(&server, 4, true);

        let item = Item::from_bytes("big.bin", b"0123456789".to_vec()).unwrap();
        match driver.push_item(item, "/").await {
            Err(PushError::Remote { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "incorrect_offset/..");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_list_follows_cursor() {
        let server = StubServer::start(|req| {
            let body = match req.path() {
                "/files/list_folder" => {
                    r#"{"entries":[
                        {".tag":"file","name":"b.txt","path_display":"/b.txt","size":3,"rev":"r1"},
                        {".tag":"deleted","name":"gone.txt"}
                    ],"cursor":"c1","has_more":true}"#
                }
                "/files/list_folder/continue" => {
                    r#"{"entries":[{".tag":"folder","name":"a","path_display":"/a"}],"cursor":"c2","has_more":false}"#
                }
                _ => return (404, Vec::new()),
            };
            (200, body.as_bytes().to_vec())
        })
        .await;
        let driver = stub_driver(&server, 4, true);

        let entries = driver.list("/").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a");
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].path, "/b.txt");
        assert_eq!(entries[1].size, Some(3));
        assert_eq!(entries[1].sha.as_deref(), Some("r1"));

        let requests = server.requests();
        assert_eq!(requests[0].header("authorization"), Some("Bearer tok"));
        let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(first, json!({ "path": "" }));
        let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(second, json!({ "cursor": "c1" }));
    }

    #[tokio::test]
    async fn test_list_missing_folder() {
        let server = StubServer::json(409, r#"{"error_summary":"path/not_found/.."}"#).await;
        let driver = stub_driver(&server, 4, true);

        match driver.list("nope\\").await {
            Err(PushError::Remote { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "Invalid Dropbox folder specified: /nope");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        let body: Value = serde_json::from_slice(&server.requests()[0].body).unwrap();
        assert_eq!(body["path"], "/nope");
    }

    #[tokio::test]
    async fn test_delete_file() {
        let server = StubServer::json(200, r#"{"metadata":{".tag":"file","name":"a.txt","size":1}}"#).await;
        let driver = stub_driver(&server, 4, true);

        driver.delete("docs/./a.txt").await.unwrap();
        let requests = server.requests();
        assert_eq!(requests[0].path(), "/files/delete_v2");
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({ "path": "/docs/a.txt" }));
    }
}
