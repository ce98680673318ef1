#![no_main]

use libfuzzer_sys::fuzz_target;
use selective::runner::libtest::scan_source;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        for test in scan_source(source) {
            assert!(!test.name.is_empty());
            assert!(test.line >= 1);
        }
    }
});
