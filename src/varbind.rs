//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value. On the wire it is a two-element
//! SEQUENCE `(OBJECT IDENTIFIER, value)`.

use crate::error::{Error, ProtocolErrorKind, Result};
use crate::oid::Oid;
use crate::value::AsnValue;

/// Variable binding - an OID-value pair.
///
/// Also the element type returned by bulk operations, in response order.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: AsnValue,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: AsnValue) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: AsnValue::Null,
        }
    }

    /// Build the `SEQUENCE { oid, value }` tree for this binding.
    pub fn to_asn(&self) -> AsnValue {
        AsnValue::Sequence(vec![
            AsnValue::ObjectIdentifier(self.oid.clone()),
            self.value.clone(),
        ])
    }

    /// Validate and unpack a decoded `SEQUENCE { oid, value }`.
    pub fn from_asn(value: AsnValue) -> Result<Self> {
        let AsnValue::Sequence(items) = value else {
            return Err(Error::protocol(ProtocolErrorKind::WrongElement {
                context: "varbind",
                expected: "SEQUENCE",
            }));
        };
        let [name, value]: [AsnValue; 2] = items.try_into().map_err(|items: Vec<AsnValue>| {
            Error::protocol(ProtocolErrorKind::WrongArity {
                context: "varbind",
                expected: 2,
                actual: items.len(),
            })
        })?;
        let AsnValue::ObjectIdentifier(oid) = name else {
            return Err(Error::protocol(ProtocolErrorKind::WrongElement {
                context: "varbind name",
                expected: "OBJECT IDENTIFIER",
            }));
        };
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Build a varbind-list SEQUENCE.
pub fn varbind_list(varbinds: &[VarBind]) -> AsnValue {
    AsnValue::Sequence(varbinds.iter().map(VarBind::to_asn).collect())
}

/// Build a varbind-list SEQUENCE with NULL values (for GET requests).
pub fn null_varbinds(oids: &[Oid]) -> AsnValue {
    AsnValue::Sequence(
        oids.iter()
            .map(|oid| VarBind::null(oid.clone()).to_asn())
            .collect(),
    )
}

/// Validate and unpack a decoded varbind-list SEQUENCE.
pub fn decode_varbind_list(value: AsnValue) -> Result<Vec<VarBind>> {
    let AsnValue::Sequence(items) = value else {
        return Err(Error::protocol(ProtocolErrorKind::WrongElement {
            context: "varbind list",
            expected: "SEQUENCE",
        }));
    };
    items.into_iter().map(VarBind::from_asn).collect()
}
