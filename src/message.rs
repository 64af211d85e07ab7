//! Community-based SNMP message format (v1/v2c).
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }` where
//! `PDU = [tag] { request-id, error-status, error-index, varbind-list }`.
//! For GetBulkRequest the middle fields are non-repeaters and
//! max-repetitions.
//!
//! Both types encode through the generic [`AsnValue`] tree. Decoding parses
//! the tree first, then validates arity and element types once, so callers
//! only ever see named fields.

use crate::error::{EncodeErrorKind, Error, ErrorStatus, ProtocolErrorKind, Result};
use crate::oid::Oid;
use crate::value::{AsnValue, PduKind};
use crate::varbind::{VarBind, decode_varbind_list, varbind_list};
use crate::version::Version;
use bytes::Bytes;

/// Request or response PDU with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type
    pub kind: PduKind,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status, or non-repeaters for GetBulkRequest
    pub error_status: i32,
    /// Error index (1-based), or max-repetitions for GetBulkRequest
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    fn request(kind: PduKind, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            kind,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(
            PduKind::GetRequest,
            request_id,
            oids.iter().cloned().map(VarBind::null).collect(),
        )
    }

    /// Create a GETNEXT request PDU.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(
            PduKind::GetNextRequest,
            request_id,
            oids.iter().cloned().map(VarBind::null).collect(),
        )
    }

    /// Create a SET request PDU.
    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self::request(PduKind::SetRequest, request_id, varbinds)
    }

    /// Create a GETBULK request PDU.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            kind: PduKind::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    /// Create a response PDU.
    pub fn response(
        request_id: i32,
        error_status: ErrorStatus,
        error_index: i32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            kind: PduKind::GetResponse,
            request_id,
            error_status: error_status.as_i32(),
            error_index,
            varbinds,
        }
    }

    /// Decoded error status.
    pub fn status(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Build the generic tree for this PDU.
    pub fn to_asn(&self) -> Result<AsnValue> {
        if self.kind == PduKind::GetBulkRequest {
            for value in [self.error_status, self.error_index] {
                if value < 0 {
                    return Err(Error::encode(EncodeErrorKind::NegativeBulkParameter {
                        value,
                    }));
                }
            }
        }
        Ok(AsnValue::Pdu(
            self.kind,
            vec![
                AsnValue::Integer(self.request_id),
                AsnValue::Integer(self.error_status),
                AsnValue::Integer(self.error_index),
                varbind_list(&self.varbinds),
            ],
        ))
    }

    /// Validate a decoded PDU element and unpack its fields.
    pub fn from_asn(value: AsnValue) -> Result<Self> {
        let AsnValue::Pdu(kind, items) = value else {
            return Err(Error::protocol(ProtocolErrorKind::WrongElement {
                context: "message pdu",
                expected: "PDU",
            }));
        };
        let [request_id, error_status, error_index, varbinds]: [AsnValue; 4] =
            items.try_into().map_err(|items: Vec<AsnValue>| {
                Error::protocol(ProtocolErrorKind::WrongArity {
                    context: "pdu",
                    expected: 4,
                    actual: items.len(),
                })
            })?;

        Ok(Pdu {
            kind,
            request_id: integer_field(request_id, "pdu request-id")?,
            error_status: integer_field(error_status, "pdu error-status")?,
            error_index: integer_field(error_index, "pdu error-index")?,
            varbinds: decode_varbind_list(varbinds)?,
        })
    }
}

fn integer_field(value: AsnValue, context: &'static str) -> Result<i32> {
    value.as_i32().ok_or_else(|| {
        Error::protocol(ProtocolErrorKind::WrongElement {
            context,
            expected: "INTEGER",
        })
    })
}

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// SNMP version
    pub version: Version,
    /// Community string
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl Message {
    /// Create a new message.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Create a V2c message.
    pub fn v2c(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self::new(Version::V2c, community, pdu)
    }

    /// Build the generic tree for this message.
    pub fn to_asn(&self) -> Result<AsnValue> {
        Ok(AsnValue::Sequence(vec![
            AsnValue::Integer(self.version.as_i32()),
            AsnValue::OctetString(self.community.clone()),
            self.pdu.to_asn()?,
        ]))
    }

    /// Encode to BER.
    pub fn encode(&self) -> Result<Bytes> {
        self.to_asn()?.to_bytes()
    }

    /// Decode from BER.
    ///
    /// BER-level problems surface as [`Error::Decode`]; a well-formed tree
    /// with the wrong shape surfaces as [`Error::Protocol`].
    pub fn decode(data: Bytes) -> Result<Self> {
        Self::from_asn(AsnValue::from_bytes(data)?)
    }

    /// Validate a decoded message tree and unpack its fields.
    pub fn from_asn(value: AsnValue) -> Result<Self> {
        let AsnValue::Sequence(items) = value else {
            return Err(Error::protocol(ProtocolErrorKind::NotASequence));
        };
        let [version, community, pdu]: [AsnValue; 3] =
            items.try_into().map_err(|items: Vec<AsnValue>| {
                Error::protocol(ProtocolErrorKind::WrongArity {
                    context: "message",
                    expected: 3,
                    actual: items.len(),
                })
            })?;

        let version_num = integer_field(version, "message version")?;
        let version = Version::from_i32(version_num)
            .ok_or_else(|| Error::protocol(ProtocolErrorKind::UnknownVersion(version_num)))?;

        let AsnValue::OctetString(community) = community else {
            return Err(Error::protocol(ProtocolErrorKind::WrongElement {
                context: "message community",
                expected: "OCTET STRING",
            }));
        };

        Ok(Message {
            version,
            community,
            pdu: Pdu::from_asn(pdu)?,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}
