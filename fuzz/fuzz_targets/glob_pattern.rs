#![no_main]

use libfuzzer_sys::fuzz_target;
use slurm_waiting_times::filter::GlobPattern;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Pattern translation must never panic, and a compiled pattern
        // must at least accept the literal text it was built from
        if !input.chars().any(|c| matches!(c, '*' | '?' | '[')) {
            if let Ok(glob) = GlobPattern::new(input) {
                assert!(glob.matches(input));
            }
        } else {
            let _ = GlobPattern::new(input);
        }
    }
});
