#![no_main]

use libfuzzer_sys::fuzz_target;
use tbt_impact::attribution::TbtImpactTasks;
use tbt_impact::snapshot::TraceSnapshot;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and attributing any snapshot must never panic
        if let Ok(snapshot) = TraceSnapshot::from_json(input) {
            let _ = TbtImpactTasks::with_default_primitive(&snapshot, &snapshot, &snapshot)
                .compute(&snapshot.input());
        }
    }
});
