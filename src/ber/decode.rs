//! BER decoding.
//!
//! Zero-copy decoding using `Bytes` to avoid allocations. Sub-decoders for
//! constructed elements track their absolute offset so errors point into the
//! original datagram.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    base: usize,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Absolute offset into the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn error(&self, kind: DecodeErrorKind) -> Error {
        tracing::debug!(target: "snmp_flow::ber", { snmp.offset = self.offset(), kind = %kind }, "decode failed");
        Error::decode(self.offset(), kind)
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        let Some(byte) = self.peek_tag() else {
            return Err(self.error(DecodeErrorKind::TruncatedData));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Read a length field.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.error(DecodeErrorKind::InsufficientData {
                needed: len,
                available: self.remaining(),
            }));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            self.offset -= 1;
            return Err(self.error(DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Read a BER integer (signed).
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read signed integer content given the length.
    ///
    /// Non-minimal encodings are accepted; content longer than four bytes is
    /// rejected as overflow.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 4 {
            return Err(self.error(DecodeErrorKind::IntegerOverflow));
        }

        let bytes = self.read_bytes(len)?;
        let mut value: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter() {
            value = (value << 8) | i32::from(byte);
        }

        Ok(value)
    }

    /// Read unsigned 32-bit content given the length.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let value = self.read_unsigned_value(len, 5)?;
        u32::try_from(value).map_err(|_| self.error(DecodeErrorKind::IntegerOverflow))
    }

    /// Read unsigned 64-bit content given the length (Counter64).
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        self.read_unsigned_value(len, 9)
    }

    fn read_unsigned_value(&mut self, len: usize, max: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > max {
            return Err(self.error(DecodeErrorKind::IntegerOverflow));
        }

        let bytes = self.read_bytes(len)?;
        // A 9-byte Counter64 must start with the sign padding byte
        if len == 9 && bytes[0] != 0 {
            return Err(self.error(DecodeErrorKind::IntegerOverflow));
        }

        Ok(bytes
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(self.error(DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read OID content given a pre-read length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let start = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(start + offset, kind),
            other => other,
        })
    }

    /// Read IpAddress content given a pre-read length.
    pub fn read_ip_address_value(&mut self, len: usize) -> Result<[u8; 4]> {
        if len != 4 {
            return Err(self.error(DecodeErrorKind::InvalidIpAddressLength { length: len }));
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Create a sub-decoder over the next `len` bytes.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            base,
        })
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        if !self.is_empty() {
            return Err(self.error(DecodeErrorKind::TrailingData {
                remaining: self.remaining(),
            }));
        }
        Ok(())
    }
}
