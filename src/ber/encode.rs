//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths.

use super::length::{MAX_LENGTH, encode_length};
use super::tag;
use crate::error::{EncodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
///
/// Content is written first, then the length and tag are prepended. Children
/// of a constructed element must therefore be pushed last-to-first.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Push multiple bytes (prepends to front, reversed).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let start_len = self.len();
        f(self)?;
        let content_len = self.len() - start_len;
        if content_len > MAX_LENGTH {
            return Err(Error::encode(EncodeErrorKind::ContentTooLong {
                length: content_len,
            }));
        }
        self.push_length(content_len);
        self.push_tag(tag);
        Ok(())
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.push_constructed(tag::universal::SEQUENCE, f)
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        let (arr, len) = encode_integer_stack(value);
        self.push_bytes(&arr[4 - len..]);
        self.push_length(len);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode a 64-bit unsigned integer (Counter64).
    pub fn push_integer64(&mut self, value: u64) {
        let (arr, len) = encode_integer64_stack(value);
        self.push_bytes(&arr[9 - len..]);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_bytes(&arr[5 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode raw content under an arbitrary primitive tag.
    pub fn push_primitive(&mut self, tag: u8, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_primitive(tag::universal::OCTET_STRING, data);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_primitive(tag::universal::NULL, &[]);
    }

    /// Encode an OBJECT IDENTIFIER.
    ///
    /// Fails when the OID has fewer than two arcs.
    pub fn push_oid(&mut self, oid: &Oid) -> Result<()> {
        let ber = oid.to_ber()?;
        self.push_primitive(tag::universal::OBJECT_IDENTIFIER, &ber);
        Ok(())
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_primitive(tag::application::IP_ADDRESS, &addr);
    }

    /// Finalize and return the encoded bytes.
    ///
    /// The buffer is reversed to produce the correct order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a signed 32-bit integer in minimal two's-complement form.
///
/// Returns a stack-allocated array and the number of valid bytes.
/// The valid bytes are at the END of the array.
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();

    let mut start = 0;
    if value >= 0 {
        while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    (bytes, 4 - start)
}

/// Encode an unsigned 32-bit integer, adding a 0x00 prefix when the MSB is set.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    let mut result = [0u8; 5];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let mut start = 1;
    while start < 4 && result[start] == 0 {
        start += 1;
    }
    if result[start] & 0x80 != 0 {
        start -= 1;
    }

    (result, 5 - start)
}

/// Encode an unsigned 64-bit integer, adding a 0x00 prefix when the MSB is set.
#[inline]
fn encode_integer64_stack(value: u64) -> ([u8; 9], usize) {
    let mut result = [0u8; 9];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let mut start = 1;
    while start < 8 && result[start] == 0 {
        start += 1;
    }
    if result[start] & 0x80 != 0 {
        start -= 1;
    }

    (result, 9 - start)
}
