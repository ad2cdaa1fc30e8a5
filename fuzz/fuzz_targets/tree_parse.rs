#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(tree) = bandpam::tree::parse_xml(text) {
            // Geschriebener Baum muss wieder parsebar sein
            if let Ok(out) = tree.to_xml_string() {
                let _ = bandpam::tree::parse_xml(&out).expect("reparse of written tree");
            }
        }
    }
});
