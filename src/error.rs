//! Error types for snmp-flow.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.
//!
//! The variants follow the failure stages of a poll:
//!
//! - [`Error::InvalidOid`] - malformed OID text, or an OID too short to encode
//! - [`Error::Encode`] - a value that cannot be represented on the wire
//! - [`Error::Decode`] - malformed BER (truncation, length overrun, unknown tag)
//! - [`Error::Io`] / [`Error::Timeout`] - socket failures, retried by the session
//! - [`Error::Protocol`] - well-formed BER whose shape does not match the request
//! - [`Error::Snmp`] - the agent answered with a non-zero error-status

use std::net::SocketAddr;
use std::time::Duration;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Tag byte does not name any supported element.
    UnknownTag(u8),
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Empty OID content.
    EmptyOid,
    /// OID content ends in the middle of a subidentifier.
    InvalidOidEncoding,
    /// Subidentifier does not fit in 32 bits.
    SubidentifierOverflow,
    /// Bytes left over after the outermost element.
    TrailingData { remaining: usize },
    /// Constructed elements nested deeper than the decoder allows.
    NestingTooDeep { max: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTag(t) => write!(f, "unknown tag 0x{:02X}", t),
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::EmptyOid => write!(f, "0 byte OID doesn't exist"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::SubidentifierOverflow => write!(f, "subidentifier overflow"),
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after message", remaining)
            }
            Self::NestingTooDeep { max } => {
                write!(f, "constructed elements nested deeper than {}", max)
            }
        }
    }
}

/// BER encode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Element content longer than the length field can describe.
    ContentTooLong { length: usize },
    /// GETBULK parameters must be non-negative.
    NegativeBulkParameter { value: i32 },
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentTooLong { length } => {
                write!(f, "content of {} bytes cannot be length-encoded", length)
            }
            Self::NegativeBulkParameter { value } => {
                write!(f, "negative GETBULK parameter: {}", value)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Invalid arc value (non-numeric, empty or out of range segment).
    InvalidArc,
    /// OID too short (minimum 2 arcs to encode).
    TooShort,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooShort => write!(f, "OID needs to be at least 2 long"),
        }
    }
}

/// Reply shape mismatches.
///
/// Raised when a reply decodes as valid BER but does not have the positional
/// layout `SEQUENCE { version, community, PDU { request-id, status, index, varbinds } }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// Top-level element is not a SEQUENCE.
    NotASequence,
    /// Container has the wrong number of children.
    WrongArity {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Child at a fixed position has the wrong type.
    WrongElement {
        context: &'static str,
        expected: &'static str,
    },
    /// Version number is not one we speak.
    UnknownVersion(i32),
    /// Reply carried no variable bindings.
    EmptyResponse,
}

impl std::fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotASequence => write!(f, "message is not a SEQUENCE"),
            Self::WrongArity {
                context,
                expected,
                actual,
            } => write!(
                f,
                "{} has {} elements, expected {}",
                context, actual, expected
            ),
            Self::WrongElement { context, expected } => {
                write!(f, "{}: expected {}", context, expected)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::EmptyResponse => write!(f, "empty response"),
        }
    }
}

/// SNMP error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during communication.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// A single attempt exceeded its deadline.
    #[error("timeout after {elapsed:?}{} (retries={retries})", target.map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        retries: u32,
    },

    /// SNMP protocol error returned by agent.
    #[error("SNMP error{}: {status} at index {index}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
        oid: Option<crate::oid::Oid>,
    },

    /// Invalid OID format.
    #[error("invalid OID{}: {kind}", input.as_ref().map(|i| format!(" {:?}", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// BER encoding error.
    #[error("encode error: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// Reply does not have the expected positional structure.
    #[error("protocol error{}: {kind}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Protocol {
        target: Option<SocketAddr>,
        kind: ProtocolErrorKind,
    },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an encode error.
    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encode { kind }
    }

    /// Create a protocol error without a target (decode time).
    pub fn protocol(kind: ProtocolErrorKind) -> Self {
        Self::Protocol { target: None, kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Whether the session retry loop should try again after this error.
    ///
    /// Only transport failures and deadline expiry are retried; everything
    /// else is surfaced to the caller immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Timeout { .. })
    }

    /// Attach the peer address to errors raised before it was known.
    pub(crate) fn with_target(self, addr: SocketAddr) -> Self {
        match self {
            Self::Protocol { target: None, kind } => Self::Protocol {
                target: Some(addr),
                kind,
            },
            other => other,
        }
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            Self::Timeout { target, .. } => *target,
            Self::Snmp { target, .. } => *target,
            Self::Protocol { target, .. } => *target,
            _ => None,
        }
    }
}
