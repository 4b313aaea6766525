#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    // The parser must be total: any input either parses or reports a
    // structured error. A panic here is a bug.
    let _ = rulegate::parse_rules_str(&s);
});
