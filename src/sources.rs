//! S3 item sources / S3文件来源
//!
//! `s3:folder/file.jpg` names an object in the configured bucket. It is read
//! through a presigned GET URL like any other remote source.

use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::config::S3SourceConfig;
use crate::error::{PushError, Result};

pub struct S3Source {
    bucket: Box<Bucket>,
    expire_secs: u32,
}

impl S3Source {
    pub fn new(config: &S3SourceConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            if config.session_token.is_empty() { None } else { Some(&config.session_token) },
            None,
            None,
        )
        .map_err(|e| PushError::Config(format!("s3: invalid credentials: {}", e)))?;

        let endpoint = if config.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", config.region)
        } else {
            config.endpoint.clone()
        };
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| PushError::Config(format!("s3: {}", e)))?;
        let bucket = if config.force_path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self {
            bucket,
            expire_secs: config.sign_url_expire_secs.max(1),
        })
    }

    /// Presigned download URL for `key` / 生成预签名下载地址
    pub async fn presigned_url(&self, key: &str) -> Result<url::Url> {
        let signed = self
            .bucket
            .presign_get(key, self.expire_secs, None)
            .await
            .map_err(|e| PushError::MissingContent(format!("s3:{}: {}", key, e)))?;
        url::Url::parse(&signed).map_err(|e| PushError::MissingContent(format!("s3:{}: {}", key, e)))
    }
}

/// Object key of an `<prefix>:<key>` source / 解析对象键
pub fn s3_key<'a>(source: &'a str, prefix: &str) -> Option<&'a str> {
    source
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(|key| key.trim_start_matches('/'))
        .filter(|key| !key.is_empty())
}
