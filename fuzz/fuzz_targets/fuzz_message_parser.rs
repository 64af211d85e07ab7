#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_flow::message::{Message, Pdu};
use snmp_flow::value::AsnValue;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Full v2c message
    let _ = Message::decode(bytes.clone());

    // Bare PDU
    if let Ok(value) = AsnValue::from_bytes(bytes) {
        let _ = Pdu::from_asn(value);
    }
});
