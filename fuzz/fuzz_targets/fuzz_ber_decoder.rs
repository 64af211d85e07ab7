#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_flow::ber::Decoder;
use snmp_flow::value::AsnValue;
use snmp_flow::varbind::{VarBind, decode_varbind_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Primitive readers
    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_null();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_sequence();

    // Recursive tree decoding, then positional views over it
    let mut decoder = Decoder::new(bytes.clone());
    if let Ok(value) = AsnValue::decode(&mut decoder) {
        let _ = VarBind::from_asn(value.clone());
        let _ = decode_varbind_list(value);
    }
});
