//! Arbitrary bytes through the line decoder.
//!
//! Decoding must never panic, and anything that decodes must re-encode to a
//! line that decodes to the same envelope.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirrorlink_proto::{Envelope, InboundEvent};

fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = Envelope::decode_line(data) else {
        return;
    };
    assert!(!envelope.event.is_empty());

    let line = envelope.encode_line().expect("decoded envelope re-encodes");
    let again = Envelope::decode_line(&line).expect("re-encoded line decodes");
    assert_eq!(again, envelope);

    let _ = InboundEvent::from_envelope(&envelope);
});
