//! Arbitrary inbound lines fed to a session mid-join.
//!
//! Whatever the mirror sends, the session never panics and never pairs
//! without a `client-join`.

#![no_main]

use std::time::Instant;

use libfuzzer_sys::fuzz_target;
use mirrorlink_core::{
    MemoryStore, RoomSession, SessionConfig, SessionEvent, SessionSignal, SessionState,
    SessionAction,
};
use mirrorlink_proto::{Envelope, RoomId};

fuzz_target!(|data: &[u8]| {
    let room = RoomId::new("ROOM42").expect("valid room");
    let mut session = RoomSession::new(SessionConfig::default(), MemoryStore::with_room(room));
    let now = Instant::now();

    session.handle(SessionEvent::Connect, now);
    session.handle(SessionEvent::TransportConnected, now);
    session.handle(SessionEvent::JoinRoom, now);

    for line in data.split(|byte| *byte == b'\n') {
        let Ok(envelope) = Envelope::decode_line(line) else {
            continue;
        };
        let is_ack = envelope.event == "client-join";
        let was_joining = session.state() == SessionState::JoiningRoom;

        let actions = session.handle(SessionEvent::Inbound(envelope), now);
        let paired = actions
            .iter()
            .any(|action| matches!(action, SessionAction::Notify(SessionSignal::DidJoinRoom)));

        assert_eq!(paired, is_ack && was_joining);
    }
});
