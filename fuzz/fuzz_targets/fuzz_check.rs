#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    let (rules, data) = input;

    let data: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return,
    };

    // Parse errors and configuration errors are expected outcomes for
    // arbitrary tables; panics and inconsistent reports are not.
    if let Ok(report) = rulegate::check(rules, &data, "fuzz") {
        if report.valid {
            assert!(
                report.errors.is_empty(),
                "a valid report must not carry errors"
            );
        }
    }
});
