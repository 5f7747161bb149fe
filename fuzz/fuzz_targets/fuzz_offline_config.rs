#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz TOML parsing of the tagged DetectorConfig and ensure it never
    // panics and rejects invalids gracefully.
    let parsed = toml::from_str::<pinch_config::DetectorConfig>(data);
    match parsed {
        Ok(cfg) => {
            let _ = cfg.validate();
        }
        Err(_e) => {
            // parse error is acceptable
        }
    }
});
