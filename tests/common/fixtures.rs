//! Common test fixtures and constants.

use snmp_flow::{AsnValue, Oid, oid};
use std::collections::BTreeMap;

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

// =============================================================================
// Interface counter columns
// =============================================================================

/// ifOutOctets: 1.3.6.1.2.1.2.2.1.10
pub fn if_out_octets() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)
}

/// ifHCInOctets: 1.3.6.1.2.1.31.1.1.1.6
pub fn if_hc_in_octets() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6)
}

/// ifHCOutOctets: 1.3.6.1.2.1.31.1.1.1.10
pub fn if_hc_out_octets() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10)
}

/// Nonexistent OID for testing NoSuchObject
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

/// V2c read community
pub const COMMUNITY: &str = "public";

/// Number of interfaces in [`switch_mib`].
pub const PORT_COUNT: u32 = 60;

/// System group plus ifTable/ifXTable octet counters for [`PORT_COUNT`] ports.
///
/// Port `n` has in-octets `n * 1000` and out-octets `n * 2000`.
pub fn switch_mib() -> BTreeMap<Oid, AsnValue> {
    let mut mib = BTreeMap::new();
    mib.insert(sys_descr(), AsnValue::from("Test switch"));
    mib.insert(sys_uptime(), AsnValue::TimeTicks(123_456));
    mib.insert(sys_contact(), AsnValue::from("noc@example.com"));
    mib.insert(sys_name(), AsnValue::from("sw-test-01"));

    for port in 1..=PORT_COUNT {
        mib.insert(
            if_out_octets().child(port),
            AsnValue::Counter32(port * 2000),
        );
        mib.insert(
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 11).child(port),
            AsnValue::Counter32(port),
        );
        mib.insert(
            if_hc_in_octets().child(port),
            AsnValue::Counter64(u64::from(port) * 1000),
        );
        mib.insert(
            if_hc_out_octets().child(port),
            AsnValue::Counter64(u64::from(port) * 2000),
        );
    }
    mib
}
