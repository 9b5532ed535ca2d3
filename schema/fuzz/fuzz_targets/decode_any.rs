#![no_main]

use commonware_schema::builtins;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let any = &builtins().any;
    let Ok(value) = any.decode(data) else {
        return;
    };

    // Anything that decodes must encode again, with an exact size
    let size = any
        .encode_size(&value)
        .expect("Failed to validate a decoded value!");
    let encoded = any.encode(&value).expect("Failed to encode a decoded value!");
    assert_eq!(size, encoded.len());
    any.decode(&encoded)
        .expect("Failed to decode a successfully encoded value!");
});
