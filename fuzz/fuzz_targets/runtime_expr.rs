#![no_main]

use libfuzzer_sys::fuzz_target;
use slurm_waiting_times::filter::parse_runtime_expr;

fuzz_target!(|data: &[u8]| {
    // Runtime expressions come straight from the command line; the
    // parser must reject arbitrary garbage without panicking
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = parse_runtime_expr(input);
    }
});
