//! Stream segments / 流分段

use bytes::Bytes;

use super::{Base64Segment, StreamError};

/// Fixed in-memory bytes / 固定字节分段
#[derive(Debug, Clone)]
pub struct LiteralSegment {
    data: Bytes,
    cursor: usize,
}

impl LiteralSegment {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Read up to `len` bytes (all remaining for `None`), `None` once drained
    /// 读取最多 `len` 字节，读完后返回 `None`
    pub fn read(&mut self, len: Option<usize>) -> Option<Bytes> {
        let remaining = self.data.len() - self.cursor;
        if remaining == 0 {
            return None;
        }
        let n = len.map_or(remaining, |len| len.min(remaining));
        let chunk = self.data.slice(self.cursor..self.cursor + n);
        self.cursor += n;
        Some(chunk)
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// One contiguous piece of a [`super::SegmentedStream`] / 组合流中的一个分段
///
/// `size()` is fixed at construction and equals the number of bytes the
/// segment yields over a full read, however the reads are chunked.
pub enum ByteSegment {
    Literal(LiteralSegment),
    Base64(Base64Segment),
}

impl ByteSegment {
    pub fn literal(data: impl Into<Bytes>) -> Self {
        ByteSegment::Literal(LiteralSegment::new(data))
    }

    pub fn size(&self) -> u64 {
        match self {
            ByteSegment::Literal(s) => s.size(),
            ByteSegment::Base64(s) => s.size(),
        }
    }

    /// `Ok(None)` means the segment is exhausted / 返回 `Ok(None)` 表示分段已读完
    pub fn read(&mut self, len: Option<usize>) -> Result<Option<Bytes>, StreamError> {
        match self {
            ByteSegment::Literal(s) => Ok(s.read(len)),
            ByteSegment::Base64(s) => s.read(len),
        }
    }

    pub fn rewind(&mut self) -> Result<(), StreamError> {
        match self {
            ByteSegment::Literal(s) => {
                s.rewind();
                Ok(())
            }
            ByteSegment::Base64(s) => s.rewind(),
        }
    }
}

impl From<LiteralSegment> for ByteSegment {
    fn from(segment: LiteralSegment) -> Self {
        ByteSegment::Literal(segment)
    }
}

impl From<Base64Segment> for ByteSegment {
    fn from(segment: Base64Segment) -> Self {
        ByteSegment::Base64(segment)
    }
}

impl std::fmt::Debug for ByteSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSegment::Literal(s) => f.debug_tuple("Literal").field(&s.size()).finish(),
            ByteSegment::Base64(s) => f.debug_tuple("Base64").field(&s.size()).finish(),
        }
    }
}
