//! Fuzz target for stroke message decoding.
//!
//! Run with: cargo +nightly fuzz run fuzz_msg_decode
//!
//! This exercises `StrokeMsg::from_wire()` and header decoding with
//! arbitrary byte sequences to find panics or out-of-bounds reads in the
//! framing and offset validation.

#![no_main]

use libfuzzer_sys::fuzz_target;

use strokectl_core::proto::headers;
use strokectl_core::StrokeMsg;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = StrokeMsg::from_wire(data) {
        // Header decoding must be total over framed input
        let _ = headers::AddConn::read(&msg);
        let _ = headers::DelConn::read(&msg);
        let _ = headers::AddCa::read(&msg);
    }
});
