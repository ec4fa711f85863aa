#![no_main]

use benchcost::parser::LineParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Kernel logs are read lossily, so feed the parser the same way
    let line = String::from_utf8_lossy(data);
    let _ = LineParser::new().parse(&line);
});
