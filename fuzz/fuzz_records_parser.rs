//! Fuzz target for the TOML records parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_records_parser
//!
//! This exercises `ConnFile::parse()` with arbitrary byte sequences to find
//! panics, hangs, or memory issues in the TOML parsing and validation
//! pipeline.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(file) = strokectl_config::records::ConnFile::parse(s) {
            // Lookups over whatever parsed must not panic either
            for conn in &file.connections {
                let _ = file.connection(&conn.name);
            }
            for ca in &file.authorities {
                let _ = file.authority(&ca.name);
            }
        }
    }
});
