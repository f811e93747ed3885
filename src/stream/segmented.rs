//! Segmented stream / 分段组合流
//!
//! Presents an ordered list of [`ByteSegment`]s as one readable stream with a
//! single cursor and a total size fixed at construction.
//! 将多个分段组合为单一可读流，总大小在构造时确定

use bytes::{Bytes, BytesMut};
use std::io::{self, Read};

use super::{ByteSegment, StreamError};

/// One logical stream over ordered segments / 按顺序组合的逻辑流
///
/// End of stream: `read_chunk(None)` yields an empty chunk, `read_chunk(Some(n))`
/// yields `None` for any `n`. Before the end, a read only comes back short when
/// it returns everything that was left.
/// 流结束时：未指定长度返回空数据，指定长度返回 `None`
#[derive(Debug)]
pub struct SegmentedStream {
    segments: Vec<ByteSegment>,
    total_size: u64,
    /// Segment currently being drained / 当前读取的分段
    active: usize,
    /// Bytes delivered from the active segment / 当前分段已交付字节数
    delivered: u64,
    /// Bytes delivered across the whole stream / 整个流已交付字节数
    position: u64,
    /// Set by a failed read, cleared by `rewind` / 读取失败后置位，重置时清除
    failed: bool,
}

impl SegmentedStream {
    pub fn new(segments: Vec<ByteSegment>) -> Self {
        let total_size = segments.iter().map(ByteSegment::size).sum();
        Self {
            segments,
            total_size,
            active: 0,
            delivered: 0,
            position: 0,
            failed: false,
        }
    }

    /// Exact stream length, usable as `Content-Length` / 流总长度
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.total_size
    }

    /// Rewind every segment and reset the cursor / 重置所有分段和游标
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        for segment in &mut self.segments {
            segment.rewind()?;
        }
        self.active = 0;
        self.delivered = 0;
        self.position = 0;
        self.failed = false;
        Ok(())
    }

    /// Read up to `len` bytes, or everything remaining for `None`
    /// 读取最多 `len` 字节；`None` 表示读取剩余全部
    ///
    /// After an error the segments are at unknown offsets, so every later read
    /// fails with [`StreamError::NeedsRewind`] until [`Self::rewind`] is called.
    pub fn read_chunk(&mut self, len: Option<usize>) -> Result<Option<Bytes>, StreamError> {
        if self.failed {
            return Err(StreamError::NeedsRewind);
        }
        let result = self.fill(len);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn fill(&mut self, len: Option<usize>) -> Result<Option<Bytes>, StreamError> {
        if self.is_eof() {
            return Ok(match len {
                None => Some(Bytes::new()),
                Some(_) => None,
            });
        }

        let remaining = self.total_size - self.position;
        let wanted = match len {
            Some(n) => (n as u64).min(remaining) as usize,
            None => usize::try_from(remaining).unwrap_or(usize::MAX),
        };

        let mut out = BytesMut::with_capacity(wanted);
        while out.len() < wanted {
            let Some(segment) = self.segments.get_mut(self.active) else {
                break;
            };
            match segment.read(Some(wanted - out.len()))? {
                Some(chunk) if !chunk.is_empty() => {
                    self.delivered += chunk.len() as u64;
                    if self.delivered > segment.size() {
                        return Err(StreamError::SizeMismatch {
                            declared: segment.size(),
                            produced: self.delivered,
                        });
                    }
                    out.extend_from_slice(&chunk);
                }
                _ => {
                    if self.delivered < segment.size() {
                        return Err(StreamError::truncated(segment.size(), self.delivered));
                    }
                    self.active += 1;
                    self.delivered = 0;
                }
            }
        }

        self.position += out.len() as u64;
        tracing::trace!(
            "Streamed {} bytes ({}/{})",
            out.len(),
            self.position,
            self.total_size
        );
        Ok(Some(out.freeze()))
    }

    /// Like [`Self::read_chunk`] but fills `out`, which is always cleared first
    /// 写入 `out`（先清空）；流结束时返回 `None` 且 `out` 为空
    pub fn read_chunk_into(
        &mut self,
        len: Option<usize>,
        out: &mut Vec<u8>,
    ) -> Result<Option<usize>, StreamError> {
        out.clear();
        match self.read_chunk(len)? {
            Some(chunk) => {
                out.extend_from_slice(&chunk);
                Ok(Some(chunk.len()))
            }
            None => Ok(None),
        }
    }

    /// Iterate the stream in `chunk_size` pieces, e.g. for `reqwest::Body::wrap_stream`
    /// 按块迭代，用于构造HTTP流式请求体
    pub fn chunks(self, chunk_size: usize) -> BodyChunks {
        BodyChunks {
            stream: self,
            chunk_size: chunk_size.max(1),
            failed: false,
        }
    }
}

impl Read for SegmentedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read_chunk(Some(buf.len()))? {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }
}

/// Chunk iterator over a [`SegmentedStream`]; stops after the first error
/// 分块迭代器，出错后终止
#[derive(Debug)]
pub struct BodyChunks {
    stream: SegmentedStream,
    chunk_size: usize,
    failed: bool,
}

impl BodyChunks {
    pub fn content_length(&self) -> u64 {
        self.stream.total_size()
    }
}

impl Iterator for BodyChunks {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.stream.read_chunk(Some(self.chunk_size)) {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}
