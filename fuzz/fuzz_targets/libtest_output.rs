#![no_main]

use libfuzzer_sys::fuzz_target;
use selective::runner::libtest::parse_libtest_output;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (stdout, stderr) = s.split_once('\0').unwrap_or((s, ""));
        let _ = parse_libtest_output("tests::it_works", stdout, stderr);
    }
});
