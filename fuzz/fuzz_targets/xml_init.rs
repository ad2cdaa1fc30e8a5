#![no_main]
use bandpam::{DataType, HistogramRequest, PamRasterBand, SimpleBand};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tree) = bandpam::tree::parse_xml(text) else {
        return;
    };
    for dt in [DataType::Byte, DataType::Int64, DataType::UInt64, DataType::Float64] {
        let mut band = PamRasterBand::new(SimpleBand::new(1, dt).with_pixels(vec![1.0, 2.0]));
        band.pam_initialize_standalone();
        if band.xml_init(&tree).is_err() {
            continue;
        }
        let _ = band.default_histogram(false);
        let _ = band.histogram(&HistogramRequest::new(0.0, 4.0, 4));
        if let Some(out) = band.serialize_to_xml() {
            let _ = out.to_xml_string();
        }
    }
});
