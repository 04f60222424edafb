//! Fuzz target for Envelope::decode
//!
//! Feeds arbitrary text to the server frame decoder to find:
//! - Parser panics on malformed JSON
//! - Type confusion between tagged and untagged variants
//! - Envelopes that decode but cannot be re-encoded
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = Envelope::decode(text) {
        // Whatever decodes must survive a re-encode and decode again
        let again = Envelope::decode(&envelope.encode());
        assert!(again.is_ok(), "re-encoded envelope rejected: {envelope:?}");
    }
});
