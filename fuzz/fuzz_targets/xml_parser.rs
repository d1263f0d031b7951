#![no_main]
use aidx::XmlParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = XmlParser::new(data).parse();
});
