//! Fuzz target for ELAN EAF parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pentoref::ir::io_eaf::from_eaf_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_eaf_slice(data);
});
