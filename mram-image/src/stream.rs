//! Append-only byte streams.
//!
//! Every artifact handed to the device is a `ByteStream`. Building is
//! append-only; once a stream is returned to a caller it is only read.

use crate::errors::{ImageError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStream {
    bytes: Vec<u8>,
}

impl ByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity) }
    }

    /// A stream of `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self { bytes: vec![0; len] }
    }

    /// Copy exactly `length` bytes of `block`, in memory order.
    ///
    /// Fails with `InvalidLength` when the view holds fewer than `length`
    /// bytes; nothing is copied in that case.
    pub fn from_raw_block(block: &[u8], length: usize) -> Result<Self> {
        if length > block.len() {
            return Err(ImageError::invalid_length(length, block.len()));
        }
        Ok(Self { bytes: block[..length].to_vec() })
    }

    #[inline]
    pub fn append(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn append_u16_le(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn append_u32_le(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn append_i32_le(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Append `count` zero bytes.
    pub fn pad(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    /// Append `other` after our own bytes. `other` is left untouched.
    pub fn merge(&mut self, other: &ByteStream) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    pub fn merge_owned(&mut self, mut other: ByteStream) {
        self.bytes.append(&mut other.bytes);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for ByteStream {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
