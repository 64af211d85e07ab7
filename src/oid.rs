//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.
//! The textual form always carries a leading dot (`.1.3.6.1`), and the empty
//! OID formats as a single `.`.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs. Cloning always yields
/// independent storage.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_flow::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.len(), 4);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation.
    ///
    /// `"."` and `""` both yield the empty OID. Otherwise one leading dot is
    /// stripped and every remaining segment must be a non-negative integer;
    /// empty segments (`"1..3"`, `"1.3."`) are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_flow::oid::Oid;
    ///
    /// let a = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    /// let b = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.to_string(), ".1.3.6.1.2.1.1.1.0");
    ///
    /// assert!(Oid::parse(".").unwrap().is_empty());
    /// assert!(Oid::parse("1.x.3").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::empty());
        }

        let body = s.strip_prefix('.').unwrap_or(s);
        let mut arcs = SmallVec::new();

        for part in body.split('.') {
            let arc: u32 = part.parse().map_err(|_| {
                Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s.to_string())
            })?;
            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Last arc, if any. For interface tables this is the ifIndex.
    pub fn last_arc(&self) -> Option<u32> {
        self.arcs.last().copied()
    }

    /// Check whether this OID lies in the subtree rooted at `prefix`.
    ///
    /// True iff `prefix` is a component-wise prefix of `self`. Every OID is
    /// within itself and within the empty OID.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_flow::oid;
    /// use snmp_flow::oid::Oid;
    ///
    /// let in_octets = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 3);
    /// assert!(in_octets.within(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)));
    /// assert!(!in_octets.within(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 11)));
    /// assert!(in_octets.within(&Oid::empty()));
    /// ```
    pub fn within(&self, prefix: &Oid) -> bool {
        self.arcs.len() >= prefix.arcs.len() && self.arcs[..prefix.arcs.len()] == prefix.arcs[..]
    }

    /// The OID with its last arc removed, or `None` for the empty OID.
    pub fn parent(&self) -> Option<Oid> {
        let (_, rest) = self.arcs.split_last()?;
        Some(Oid::from_slice(rest))
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Encode the OID content octets.
    ///
    /// The first two arcs are packed into a single byte as `40 * a0 + a1`.
    /// The arcs are combined without validation, so combinations that do not
    /// fit a byte are truncated rather than rejected. Remaining arcs are
    /// big-endian base-128 with the continuation bit on all but the last byte.
    ///
    /// Fails with [`OidErrorKind::TooShort`] when the OID has fewer than two arcs.
    pub fn to_ber(&self) -> Result<SmallVec<[u8; 64]>> {
        if self.arcs.len() < 2 {
            return Err(Error::invalid_oid(OidErrorKind::TooShort));
        }

        let mut bytes = SmallVec::new();
        let first = self.arcs[0].wrapping_mul(40).wrapping_add(self.arcs[1]);
        bytes.push(first as u8);

        for &arc in &self.arcs[2..] {
            encode_subidentifier(&mut bytes, arc);
        }

        Ok(bytes)
    }

    /// Decode OID content octets.
    ///
    /// The first byte splits into `(byte / 40, byte % 40)`; the rest is grouped
    /// into base-128 subidentifiers by continuation bit.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        let Some((&first, rest)) = data.split_first() else {
            return Err(Error::decode(0, DecodeErrorKind::EmptyOid));
        };

        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        arcs.push(u32::from(first / 40));
        arcs.push(u32::from(first % 40));

        let mut i = 0;
        while i < rest.len() {
            let (arc, consumed) = decode_subidentifier(&rest[i..], i + 1)?;
            arcs.push(arc);
            i += consumed;
        }

        Ok(Self { arcs })
    }
}

/// Encode a subidentifier in base-128 variable length.
#[inline]
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    if value == 0 {
        bytes.push(0);
        return;
    }

    let mut temp = value;
    let mut count = 0;
    while temp > 0 {
        count += 1;
        temp >>= 7;
    }

    for i in (0..count).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode a subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8], base_offset: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut i = 0;

    loop {
        let Some(&byte) = data.get(i) else {
            return Err(Error::decode(
                base_offset + i,
                DecodeErrorKind::InvalidOidEncoding,
            ));
        };
        i += 1;

        if value > (u32::MAX >> 7) {
            return Err(Error::decode(
                base_offset + i,
                DecodeErrorKind::SubidentifierOverflow,
            ));
        }

        value = (value << 7) | u32::from(byte & 0x7F);

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, i))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arcs.is_empty() {
            return f.write_str(".");
        }
        for arc in &self.arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use snmp_flow::oid;
///
/// let if_hc_in_octets = oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6);
/// assert_eq!(if_hc_in_octets.to_string(), ".1.3.6.1.2.1.31.1.1.1.6");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
