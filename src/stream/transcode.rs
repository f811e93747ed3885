//! Base64 transcoding reader / Base64转码读取器
//!
//! Reads the raw source one block at a time and keeps only the encoded bytes
//! not yet handed to the caller. The block size is a multiple of 3, so every
//! block encodes to whole quartets and blocks can be encoded independently.
//! 按块读取并编码，块大小为3的倍数，保证每块独立编码结果可直接拼接

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::{Bytes, BytesMut};
use std::io::{Read, Seek, SeekFrom};

use super::{encoded_len, ByteSource, StreamError};

/// Raw bytes transcoded per step / 每次转码的原始字节数
pub const DEFAULT_BLOCK_SIZE: usize = 12288;

/// Base64 view over a raw byte source / 原始字节源的base64视图
pub struct Base64Segment {
    source: Box<dyn ByteSource>,
    /// Raw length captured at construction / 构造时记录的原始长度
    raw_length: u64,
    /// Encoded size, never recomputed / 编码后大小（不再变化）
    encoded_size: u64,
    block_size: usize,
    /// Encoded bytes not yet delivered / 尚未交付的已编码数据
    pending: BytesMut,
    block: Vec<u8>,
    scratch: String,
    consumed: u64,
    source_done: bool,
}

impl Base64Segment {
    /// Wrap `source` whose exact length is `raw_length`; the source is rewound
    /// 包装已知长度的数据源（会先重置到开头）
    pub fn new<S: ByteSource + 'static>(source: S, raw_length: u64) -> Result<Self, StreamError> {
        let mut source: Box<dyn ByteSource> = Box::new(source);
        source.rewind()?;
        Ok(Self {
            source,
            raw_length,
            encoded_size: encoded_len(raw_length),
            block_size: DEFAULT_BLOCK_SIZE,
            pending: BytesMut::new(),
            block: Vec::new(),
            scratch: String::new(),
            consumed: 0,
            source_done: false,
        })
    }

    /// Wrap `source`, measuring its length once by seeking to the end
    /// 通过定位到末尾测量长度
    pub fn from_source<S: ByteSource + 'static>(mut source: S) -> Result<Self, StreamError> {
        let raw_length = source.seek(SeekFrom::End(0))?;
        Self::new(source, raw_length)
    }

    pub fn with_block_size(mut self, block_size: usize) -> Result<Self, StreamError> {
        if block_size == 0 || block_size % 3 != 0 {
            return Err(StreamError::InvalidBlockSize(block_size));
        }
        self.block_size = block_size;
        Ok(self)
    }

    pub fn size(&self) -> u64 {
        self.encoded_size
    }

    /// Read up to `len` encoded bytes (everything remaining for `None`)
    /// 读取最多 `len` 字节编码数据，数据源与缓冲均耗尽时返回 `None`
    pub fn read(&mut self, len: Option<usize>) -> Result<Option<Bytes>, StreamError> {
        let wanted = len.unwrap_or(usize::MAX);
        while self.pending.len() < wanted && !self.source_done {
            self.transcode_block()?;
        }

        if self.pending.is_empty() && self.source_done {
            return Ok(None);
        }
        let n = wanted.min(self.pending.len());
        Ok(Some(self.pending.split_to(n).freeze()))
    }

    /// Reset the source to its start and drop pending output / 重置数据源并清空缓冲
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.source.rewind()?;
        self.pending.clear();
        self.consumed = 0;
        self.source_done = false;
        Ok(())
    }

    fn transcode_block(&mut self) -> Result<(), StreamError> {
        self.block.clear();
        // Fill the whole block so short OS reads never break quartet alignment
        let read = self
            .source
            .by_ref()
            .take(self.block_size as u64)
            .read_to_end(&mut self.block)?;

        if read < self.block_size {
            self.source_done = true;
        }
        self.consumed += read as u64;

        if self.consumed > self.raw_length {
            return Err(StreamError::SizeMismatch {
                declared: self.encoded_size,
                produced: encoded_len(self.consumed),
            });
        }
        if self.source_done && self.consumed < self.raw_length {
            return Err(StreamError::truncated(self.raw_length, self.consumed));
        }
        if !self.source_done && self.consumed == self.raw_length {
            // Declared length reached, the source has to be exhausted as well
            let mut extra_byte = Vec::with_capacity(1);
            let extra = self.source.by_ref().take(1).read_to_end(&mut extra_byte)?;
            if extra > 0 {
                return Err(StreamError::SizeMismatch {
                    declared: self.encoded_size,
                    produced: encoded_len(self.consumed + extra as u64),
                });
            }
            self.source_done = true;
        }

        if read > 0 {
            self.scratch.clear();
            BASE64.encode_string(&self.block, &mut self.scratch);
            self.pending.extend_from_slice(self.scratch.as_bytes());
        }
        Ok(())
    }
}
