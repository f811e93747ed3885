//! Constant-memory request body streaming / 恒定内存请求体流
//!
//! Builds HTTP bodies that embed a base64-encoded file without ever holding the
//! whole encoded payload in memory. The exact body length is known before the
//! first byte is read, so callers can send `Content-Length` up front.
//! 构建内嵌base64文件内容的请求体，总长度在读取前即可确定

use std::io::{self, Read, Seek};
use thiserror::Error;

mod segment;
mod segmented;
mod transcode;

pub use segment::{ByteSegment, LiteralSegment};
pub use segmented::{BodyChunks, SegmentedStream};
pub use transcode::{Base64Segment, DEFAULT_BLOCK_SIZE};

/// Opening fragment of the blob-creation JSON body / JSON请求体开头
pub const JSON_PREFIX: &[u8] = br#"{"content":""#;

/// Closing fragment of the blob-creation JSON body / JSON请求体结尾
pub const JSON_SUFFIX: &[u8] = br#"","encoding":"base64"}"#;

/// Seekable raw byte source with a knowable length / 可定位的原始字节源
///
/// Local files, downloaded temp files and in-memory cursors all qualify.
pub trait ByteSource: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync + ?Sized> ByteSource for T {}

/// Stream error / 流错误
#[derive(Debug, Error)]
pub enum StreamError {
    /// The raw source could not be read / 原始数据源读取失败
    #[error("source read failed: {0}")]
    SourceRead(#[from] io::Error),

    /// A segment produced more bytes than it declared / 分段输出超过声明长度
    #[error("segment produced {produced} bytes but declared {declared}")]
    SizeMismatch { declared: u64, produced: u64 },

    /// Transcoding block size must be a positive multiple of 3 / 块大小必须为3的正整数倍
    #[error("block size {0} is not a positive multiple of 3")]
    InvalidBlockSize(usize),

    /// An earlier read failed; the stream must be rewound / 之前的读取失败，需要先重置
    #[error("stream failed earlier, rewind before reading again")]
    NeedsRewind,
}

impl StreamError {
    /// Source ended before delivering its declared length / 数据源提前结束
    pub(crate) fn truncated(declared: u64, delivered: u64) -> Self {
        StreamError::SourceRead(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("source ended after {} of {} bytes", delivered, declared),
        ))
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::SourceRead(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Base64 output length for `raw` input bytes, padding included / base64编码后长度
pub fn encoded_len(raw: u64) -> u64 {
    raw.div_ceil(3) * 4
}

/// Build the `{"content":"<base64>","encoding":"base64"}` body for `source`
/// 为数据源构建blob JSON请求体
pub fn json_blob_body<S: ByteSource + 'static>(source: S) -> Result<SegmentedStream, StreamError> {
    json_blob_body_with_block_size(source, DEFAULT_BLOCK_SIZE)
}

/// Same as [`json_blob_body`] with an explicit transcoding block size
pub fn json_blob_body_with_block_size<S: ByteSource + 'static>(
    source: S,
    block_size: usize,
) -> Result<SegmentedStream, StreamError> {
    let encoded = Base64Segment::from_source(source)?.with_block_size(block_size)?;
    Ok(SegmentedStream::new(vec![
        ByteSegment::literal(JSON_PREFIX),
        ByteSegment::from(encoded),
        ByteSegment::literal(JSON_SUFFIX),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(2), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
        assert_eq!(encoded_len(14), 20);
        assert_eq!(encoded_len(15), 20);
        assert_eq!(encoded_len(12288), 16384);
    }

    #[test]
    fn test_json_blob_body() {
        let mut body = json_blob_body(Cursor::new(b"This is a test".to_vec())).unwrap();
        assert_eq!(body.total_size(), 12 + 20 + 22);

        let all = body.read_chunk(None).unwrap().unwrap();
        assert_eq!(&all[..], br#"{"content":"VGhpcyBpcyBhIHRlc3Q=","encoding":"base64"}"#);
        assert!(body.is_eof());
    }

    #[test]
    fn test_json_blob_body_rewinds_source() {
        let mut source = Cursor::new(b"abcdef".to_vec());
        source.set_position(4);
        let mut body = json_blob_body(source).unwrap();
        let all = body.read_chunk(None).unwrap().unwrap();
        assert_eq!(&all[..], br#"{"content":"YWJjZGVm","encoding":"base64"}"#);
    }

    #[test]
    fn test_stream_error_into_io() {
        let err: io::Error = StreamError::truncated(10, 4).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = StreamError::SizeMismatch { declared: 4, produced: 8 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = StreamError::NeedsRewind.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
