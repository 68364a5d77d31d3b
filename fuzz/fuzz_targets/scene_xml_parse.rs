//! Fuzz target for scene XML parsing and path lookups.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pentoref::ir::io_scene_xml::from_scene_xml_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(document) = from_scene_xml_slice(data) {
        let _ = document.find_all(".//piece");
        let _ = document.find_all("timestamp/object");
    }
});
