//! Fuzz target for TextGrid decoding.
//!
//! Feeds arbitrary bytes through the UTF-8/UTF-16 detection and both the
//! long and short TextGrid grammars, checking for panics or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pentoref::ir::io_textgrid::from_textgrid_slice;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_textgrid_slice(data);
});
