//! Recursive BER value tree.
//!
//! [`AsnValue`] is a closed variant over everything an SNMPv2c message can
//! carry: universal primitives, SEQUENCE, the five PDU containers, the SMIv2
//! application types and the v2c exception markers. Encoding and decoding are
//! generic over the tree and know nothing about message layout; positional
//! validation lives in [`crate::message`].

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Maximum nesting of constructed elements accepted by [`AsnValue::decode`].
///
/// A v2c message nests four levels deep (message, PDU, varbind list,
/// varbind); anything beyond this is hostile input.
pub const MAX_DEPTH: usize = 32;

/// The five PDU containers spoken by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduKind {
    GetRequest,
    GetNextRequest,
    GetResponse,
    SetRequest,
    GetBulkRequest,
}

impl PduKind {
    /// The context-specific constructed tag for this PDU.
    pub const fn tag(self) -> u8 {
        match self {
            PduKind::GetRequest => tag::pdu::GET_REQUEST,
            PduKind::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            PduKind::GetResponse => tag::pdu::RESPONSE,
            PduKind::SetRequest => tag::pdu::SET_REQUEST,
            PduKind::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
        }
    }

    /// Map a tag byte back to a PDU kind.
    pub const fn from_tag(t: u8) -> Option<Self> {
        match t {
            tag::pdu::GET_REQUEST => Some(PduKind::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(PduKind::GetNextRequest),
            tag::pdu::RESPONSE => Some(PduKind::GetResponse),
            tag::pdu::SET_REQUEST => Some(PduKind::SetRequest),
            tag::pdu::GET_BULK_REQUEST => Some(PduKind::GetBulkRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for PduKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PduKind::GetRequest => write!(f, "GetRequest"),
            PduKind::GetNextRequest => write!(f, "GetNextRequest"),
            PduKind::GetResponse => write!(f, "GetResponse"),
            PduKind::SetRequest => write!(f, "SetRequest"),
            PduKind::GetBulkRequest => write!(f, "GetBulkRequest"),
        }
    }
}

/// A decoded or encodable protocol element.
#[derive(Debug, Clone, PartialEq)]
pub enum AsnValue {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING
    OctetString(Bytes),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// SEQUENCE of child elements, in order.
    Sequence(Vec<AsnValue>),
    /// PDU container; children are positional like a SEQUENCE.
    Pdu(PduKind, Vec<AsnValue>),
    /// IpAddress (4 bytes, network order)
    IpAddress([u8; 4]),
    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks (hundredths of seconds)
    TimeTicks(u32),
    /// Opaque (arbitrary bytes)
    Opaque(Bytes),
    /// Counter64 (unsigned 64-bit, wrapping)
    Counter64(u64),
    /// noSuchObject exception
    NoSuchObject,
    /// noSuchInstance exception
    NoSuchInstance,
    /// endOfMibView exception
    EndOfMibView,
}

impl AsnValue {
    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AsnValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    ///
    /// Covers Counter64, the 32-bit unsigned types and non-negative Integer.
    /// This is how interface octet counters are read regardless of whether
    /// the agent answers from the 32-bit or the high-capacity table.
    ///
    /// ```
    /// use snmp_flow::AsnValue;
    ///
    /// assert_eq!(AsnValue::Counter64(10_000_000_000).as_u64(), Some(10_000_000_000));
    /// assert_eq!(AsnValue::Counter32(100).as_u64(), Some(100));
    /// assert_eq!(AsnValue::Integer(-1).as_u64(), None);
    /// ```
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AsnValue::Counter64(v) => Some(*v),
            AsnValue::Counter32(v) | AsnValue::Gauge32(v) | AsnValue::TimeTicks(v) => {
                Some(u64::from(*v))
            }
            AsnValue::Integer(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AsnValue::Integer(v) => Some(i64::from(*v)),
            AsnValue::Counter32(v) | AsnValue::Gauge32(v) | AsnValue::TimeTicks(v) => {
                Some(i64::from(*v))
            }
            AsnValue::Counter64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get as raw bytes (OctetString or Opaque).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AsnValue::OctetString(v) | AsnValue::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as an OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            AsnValue::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Children of a SEQUENCE or PDU.
    pub fn children(&self) -> Option<&[AsnValue]> {
        match self {
            AsnValue::Sequence(items) | AsnValue::Pdu(_, items) => Some(items),
            _ => None,
        }
    }

    /// Check if this is one of the v2c exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            AsnValue::NoSuchObject | AsnValue::NoSuchInstance | AsnValue::EndOfMibView
        )
    }

    /// Short name of the variant, used in protocol error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AsnValue::Integer(_) => "INTEGER",
            AsnValue::OctetString(_) => "OCTET STRING",
            AsnValue::Null => "NULL",
            AsnValue::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            AsnValue::Sequence(_) => "SEQUENCE",
            AsnValue::Pdu(..) => "PDU",
            AsnValue::IpAddress(_) => "IpAddress",
            AsnValue::Counter32(_) => "Counter32",
            AsnValue::Gauge32(_) => "Gauge32",
            AsnValue::TimeTicks(_) => "TimeTicks",
            AsnValue::Opaque(_) => "Opaque",
            AsnValue::Counter64(_) => "Counter64",
            AsnValue::NoSuchObject => "noSuchObject",
            AsnValue::NoSuchInstance => "noSuchInstance",
            AsnValue::EndOfMibView => "endOfMibView",
        }
    }

    /// Encode to BER.
    ///
    /// Only fails when an OID inside the tree has fewer than two arcs or a
    /// constructed element grows past the maximum length.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        match self {
            AsnValue::Integer(v) => buf.push_integer(*v),
            AsnValue::OctetString(data) => buf.push_octet_string(data),
            AsnValue::Null => buf.push_null(),
            AsnValue::ObjectIdentifier(oid) => buf.push_oid(oid)?,
            AsnValue::Sequence(items) => buf.push_sequence(|buf| encode_children(buf, items))?,
            AsnValue::Pdu(kind, items) => {
                buf.push_constructed(kind.tag(), |buf| encode_children(buf, items))?
            }
            AsnValue::IpAddress(addr) => buf.push_ip_address(*addr),
            AsnValue::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            AsnValue::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            AsnValue::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            AsnValue::Opaque(data) => buf.push_primitive(tag::application::OPAQUE, data),
            AsnValue::Counter64(v) => buf.push_integer64(*v),
            AsnValue::NoSuchObject => buf.push_primitive(tag::context::NO_SUCH_OBJECT, &[]),
            AsnValue::NoSuchInstance => buf.push_primitive(tag::context::NO_SUCH_INSTANCE, &[]),
            AsnValue::EndOfMibView => buf.push_primitive(tag::context::END_OF_MIB_VIEW, &[]),
        }
        Ok(())
    }

    /// Encode to a standalone byte buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = EncodeBuf::new();
        self.encode(&mut buf)?;
        Ok(buf.finish())
    }

    /// Decode one element from the decoder.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        decode_at_depth(decoder, 0)
    }

    /// Decode a buffer holding exactly one element.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let value = Self::decode(&mut decoder)?;
        decoder.finish()?;
        Ok(value)
    }
}

fn encode_children(buf: &mut EncodeBuf, items: &[AsnValue]) -> Result<()> {
    // Reverse buffer: last child first
    for item in items.iter().rev() {
        item.encode(buf)?;
    }
    Ok(())
}

fn decode_children(decoder: &mut Decoder, len: usize, depth: usize) -> Result<Vec<AsnValue>> {
    if depth >= MAX_DEPTH {
        return Err(Error::decode(
            decoder.offset(),
            DecodeErrorKind::NestingTooDeep { max: MAX_DEPTH },
        ));
    }
    let mut content = decoder.sub_decoder(len)?;
    let mut items = Vec::new();
    while !content.is_empty() {
        items.push(decode_at_depth(&mut content, depth + 1)?);
    }
    Ok(items)
}

fn decode_at_depth(decoder: &mut Decoder, depth: usize) -> Result<AsnValue> {
    let tag_offset = decoder.offset();
    let t = decoder.read_tag()?;
    let len = decoder.read_length()?;

    let value = match t {
        tag::universal::INTEGER => AsnValue::Integer(decoder.read_integer_value(len)?),
        tag::universal::OCTET_STRING => AsnValue::OctetString(decoder.read_bytes(len)?),
        tag::universal::NULL => {
            if len != 0 {
                return Err(Error::decode(tag_offset, DecodeErrorKind::InvalidNull));
            }
            AsnValue::Null
        }
        tag::universal::OBJECT_IDENTIFIER => {
            AsnValue::ObjectIdentifier(decoder.read_oid_value(len)?)
        }
        tag::universal::SEQUENCE => AsnValue::Sequence(decode_children(decoder, len, depth)?),
        tag::application::IP_ADDRESS => AsnValue::IpAddress(decoder.read_ip_address_value(len)?),
        tag::application::COUNTER32 => AsnValue::Counter32(decoder.read_unsigned32_value(len)?),
        tag::application::GAUGE32 => AsnValue::Gauge32(decoder.read_unsigned32_value(len)?),
        tag::application::TIMETICKS => AsnValue::TimeTicks(decoder.read_unsigned32_value(len)?),
        tag::application::OPAQUE => AsnValue::Opaque(decoder.read_bytes(len)?),
        tag::application::COUNTER64 => AsnValue::Counter64(decoder.read_integer64_value(len)?),
        tag::context::NO_SUCH_OBJECT | tag::context::NO_SUCH_INSTANCE | tag::context::END_OF_MIB_VIEW => {
            // Content is meaningless; skip whatever the agent put there
            decoder.read_bytes(len)?;
            match t {
                tag::context::NO_SUCH_OBJECT => AsnValue::NoSuchObject,
                tag::context::NO_SUCH_INSTANCE => AsnValue::NoSuchInstance,
                _ => AsnValue::EndOfMibView,
            }
        }
        other => match PduKind::from_tag(other) {
            Some(kind) => AsnValue::Pdu(kind, decode_children(decoder, len, depth)?),
            None => {
                tracing::debug!(target: "snmp_flow::ber", { snmp.offset = tag_offset, tag = other }, "unknown tag");
                return Err(Error::decode(tag_offset, DecodeErrorKind::UnknownTag(other)));
            }
        },
    };

    Ok(value)
}

impl std::fmt::Display for AsnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsnValue::Integer(v) => write!(f, "{}", v),
            AsnValue::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "0x{}", hex(data)),
            },
            AsnValue::Null => write!(f, "NULL"),
            AsnValue::ObjectIdentifier(oid) => write!(f, "{}", oid),
            AsnValue::Sequence(items) => write_items(f, "SEQUENCE", items),
            AsnValue::Pdu(kind, items) => write_items(f, &kind.to_string(), items),
            AsnValue::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            AsnValue::Counter32(v) | AsnValue::Gauge32(v) => write!(f, "{}", v),
            AsnValue::TimeTicks(v) => write!(f, "({}) {}s", v, v / 100),
            AsnValue::Opaque(data) => write!(f, "Opaque(0x{})", hex(data)),
            AsnValue::Counter64(v) => write!(f, "{}", v),
            AsnValue::NoSuchObject => write!(f, "noSuchObject"),
            AsnValue::NoSuchInstance => write!(f, "noSuchInstance"),
            AsnValue::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

fn write_items(f: &mut std::fmt::Formatter<'_>, name: &str, items: &[AsnValue]) -> std::fmt::Result {
    write!(f, "{} {{", name)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, " {}", item)?;
    }
    write!(f, " }}")
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

impl From<i32> for AsnValue {
    fn from(v: i32) -> Self {
        AsnValue::Integer(v)
    }
}

impl From<&str> for AsnValue {
    fn from(s: &str) -> Self {
        AsnValue::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Oid> for AsnValue {
    fn from(oid: Oid) -> Self {
        AsnValue::ObjectIdentifier(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn roundtrip(value: AsnValue) {
        let bytes = value.to_bytes().unwrap();
        let decoded = AsnValue::from_bytes(bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_primitive_roundtrips() {
        roundtrip(AsnValue::Integer(0));
        roundtrip(AsnValue::Integer(-129));
        roundtrip(AsnValue::Integer(i32::MAX));
        roundtrip(AsnValue::OctetString(Bytes::from_static(b"public")));
        roundtrip(AsnValue::OctetString(Bytes::new()));
        roundtrip(AsnValue::Null);
        roundtrip(AsnValue::ObjectIdentifier(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)));
        roundtrip(AsnValue::IpAddress([10, 0, 0, 1]));
        roundtrip(AsnValue::Counter32(u32::MAX));
        roundtrip(AsnValue::Gauge32(1_000_000_000));
        roundtrip(AsnValue::TimeTicks(123456));
        roundtrip(AsnValue::Opaque(Bytes::from_static(&[0x9f, 0x78, 0x04])));
        roundtrip(AsnValue::Counter64(u64::MAX));
        roundtrip(AsnValue::NoSuchObject);
        roundtrip(AsnValue::NoSuchInstance);
        roundtrip(AsnValue::EndOfMibView);
    }

    #[test]
    fn test_nested_sequence_roundtrip() {
        roundtrip(AsnValue::Sequence(vec![]));
        roundtrip(AsnValue::Sequence(vec![
            AsnValue::Integer(1),
            AsnValue::Sequence(vec![
                AsnValue::ObjectIdentifier(oid!(1, 3, 6)),
                AsnValue::Sequence(vec![AsnValue::Null]),
            ]),
            AsnValue::OctetString(Bytes::from(vec![0u8; 300])),
        ]));
    }

    #[test]
    fn test_pdu_roundtrip() {
        for kind in [
            PduKind::GetRequest,
            PduKind::GetNextRequest,
            PduKind::GetResponse,
            PduKind::SetRequest,
            PduKind::GetBulkRequest,
        ] {
            roundtrip(AsnValue::Pdu(
                kind,
                vec![
                    AsnValue::Integer(42),
                    AsnValue::Integer(0),
                    AsnValue::Integer(0),
                    AsnValue::Sequence(vec![]),
                ],
            ));
            roundtrip(AsnValue::Pdu(
                kind,
                vec![
                    AsnValue::Integer(42),
                    AsnValue::Integer(0),
                    AsnValue::Integer(10),
                    AsnValue::Sequence(vec![
                        AsnValue::Sequence(vec![
                            AsnValue::ObjectIdentifier(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1)),
                            AsnValue::Counter32(7),
                        ]),
                        AsnValue::Sequence(vec![
                            AsnValue::ObjectIdentifier(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 2)),
                            AsnValue::Null,
                        ]),
                    ]),
                ],
            ));
        }
    }

    #[test]
    fn test_encoding_bytes() {
        let value = AsnValue::Sequence(vec![AsnValue::Integer(1), AsnValue::Null]);
        assert_eq!(
            &value.to_bytes().unwrap()[..],
            &[0x30, 0x05, 0x02, 0x01, 0x01, 0x05, 0x00]
        );

        let pdu = AsnValue::Pdu(PduKind::GetBulkRequest, vec![]);
        assert_eq!(&pdu.to_bytes().unwrap()[..], &[0xA5, 0x00]);
    }

    #[test]
    fn test_encode_short_oid_fails() {
        let value = AsnValue::Sequence(vec![AsnValue::ObjectIdentifier(oid!(1))]);
        assert!(value.to_bytes().is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = AsnValue::from_bytes(Bytes::from_static(&[0x1F, 0x00])).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 0,
                kind: DecodeErrorKind::UnknownTag(0x1F)
            }
        ));
    }

    #[test]
    fn test_truncated_rejected() {
        // SEQUENCE claims 5 bytes, only 2 present
        assert!(AsnValue::from_bytes(Bytes::from_static(&[0x30, 0x05, 0x02, 0x01])).is_err());
        // child overruns its parent
        assert!(AsnValue::from_bytes(Bytes::from_static(&[0x30, 0x02, 0x04, 0x05, 0x00])).is_err());
        assert!(AsnValue::from_bytes(Bytes::new()).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let mut data = Vec::new();
        for _ in 0..(MAX_DEPTH + 2) {
            data.extend_from_slice(&[0x30, 0x80]);
        }
        // Indefinite lengths fail before depth does; build definite nesting instead
        let mut value = AsnValue::Null;
        for _ in 0..(MAX_DEPTH + 2) {
            value = AsnValue::Sequence(vec![value]);
        }
        let bytes = value.to_bytes().unwrap();
        assert!(matches!(
            AsnValue::from_bytes(bytes),
            Err(Error::Decode {
                kind: DecodeErrorKind::NestingTooDeep { .. },
                ..
            })
        ));
        assert!(AsnValue::from_bytes(Bytes::from(data)).is_err());
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(AsnValue::Counter64(5).as_i64(), Some(5));
        assert_eq!(AsnValue::Counter64(u64::MAX).as_i64(), None);
        assert_eq!(AsnValue::Integer(-5).as_i64(), Some(-5));
        assert_eq!(AsnValue::Gauge32(9).as_u64(), Some(9));
        assert_eq!(AsnValue::Null.as_u64(), None);
        assert!(AsnValue::EndOfMibView.is_exception());
    }

    #[test]
    fn test_display() {
        assert_eq!(AsnValue::from("eth0").to_string(), "eth0");
        assert_eq!(AsnValue::IpAddress([10, 0, 0, 1]).to_string(), "10.0.0.1");
        assert_eq!(
            AsnValue::ObjectIdentifier(oid!(1, 3, 6)).to_string(),
            ".1.3.6"
        );
        assert_eq!(
            AsnValue::Sequence(vec![AsnValue::Integer(1), AsnValue::Null]).to_string(),
            "SEQUENCE { 1, NULL }"
        );
    }
}
