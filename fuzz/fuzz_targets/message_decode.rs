//! Fuzz target for ClientMessage::decode
//!
//! Every inbound text frame from a client goes through this decoder, so it
//! must reject anything malformed without panicking:
//! - Invalid JSON and non-object envelopes
//! - Unknown or server-only type tags
//! - Payloads of the wrong shape (strings for numbers, missing fields)
//! - Huge or deeply nested values
//!
//! # Invariants
//!
//! - NEVER panic
//! - Anything accepted re-encodes and decodes to the same message type

#![no_main]

use libfuzzer_sys::fuzz_target;
use videosync_proto::ClientMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = ClientMessage::decode(text) {
        let encoded = message.encode().expect("accepted message must encode");
        let decoded = ClientMessage::decode(&encoded).expect("encoded message must decode");
        assert_eq!(decoded.kind(), message.kind());
    }
});
