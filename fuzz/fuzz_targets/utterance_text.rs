//! Fuzz target for utterance cleaning and inline markup parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pentoref::text::fuzz_utterance_text;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(input) = std::str::from_utf8(data) {
        fuzz_utterance_text(input);
    }
});
