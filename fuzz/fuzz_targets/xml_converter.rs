#![no_main]
use aidx::{from_json, to_json_compact, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(result) = aidx::from_str(s) {
            let value = Value::Mapping(result);
            let json = to_json_compact(&value).unwrap_or_default();
            // serde_json stops reading past 128 levels of nesting
            if let Ok(back) = from_json(&json) {
                assert_eq!(back, value);
            }
        }
    }
});
