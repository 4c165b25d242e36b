#![no_main]

use libfuzzer_sys::fuzz_target;

use wasmstack::encoder::encode;
use wasmstack::parser::decode;

fuzz_target!(|data: &[u8]| {
    // We don't care about the result - we're looking for panics/crashes
    let module = match decode(data) {
        Ok(m) => m,
        Err(_) => return,
    };
    let _ = module.validate_all();
    let _ = module.to_string();

    // a decoded module re-encodes to bytes that decode to the same sections
    let again = decode(&encode(&module)[..]).expect("re-encoded module should decode");
    assert_eq!(module.sections(), again.sections());
});
