//! End-to-end pairing over turmoil's simulated network.
//!
//! The real runtime and line transport talk to a simulated mirror host:
//! - Join acknowledged in time
//! - Join acknowledged just inside the timeout, with network latency
//! - Join never acknowledged
//! - Exit reaches the mirror before the socket closes

use std::time::Duration;

use mirrorlink_client::spawn;
use mirrorlink_core::{
    EndpointConfig, MemoryStore, ROOM_UNREACHABLE, SessionConfig, SessionSignal,
};
use mirrorlink_harness::{
    MirrorBehavior, MirrorLog, SimConnector, SimTransport,
    sim_mirror::{received, serve},
};
use mirrorlink_proto::RoomId;
use tokio::{sync::broadcast, time::Instant};

fn config() -> SessionConfig {
    SessionConfig {
        endpoint: EndpointConfig {
            staging_host: "mirror".to_string(),
            production: false,
            ..EndpointConfig::default()
        },
        user_id: Some("tester".to_string()),
        ..SessionConfig::default()
    }
}

fn room() -> RoomId {
    RoomId::new("ROOM42").expect("valid room")
}

fn mirror_host(sim: &mut turmoil::Sim<'_>, behavior: MirrorBehavior) -> MirrorLog {
    let log = MirrorLog::default();
    let host_log = log.clone();
    sim.host("mirror", move || serve(behavior, host_log.clone()));
    log
}

/// Wait for `expected`, returning everything seen before it.
async fn wait_for(
    signals: &mut broadcast::Receiver<SessionSignal>,
    expected: &SessionSignal,
) -> Vec<SessionSignal> {
    let mut seen = Vec::new();
    loop {
        let signal = signals.recv().await.expect("signal stream open");
        if signal == *expected {
            return seen;
        }
        seen.push(signal);
    }
}

#[test]
fn pairs_with_mirror_and_exits() {
    let mut sim =
        turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();
    let log = mirror_host(&mut sim, MirrorBehavior::ack_after(Duration::from_secs(1)));

    sim.client("phone", async move {
        let transport = SimTransport::new(SimConnector);
        let (handle, _task) = spawn(config(), transport, MemoryStore::with_room(room()));
        let mut signals = handle.subscribe();

        handle.connect()?;
        wait_for(&mut signals, &SessionSignal::DidConnect).await;
        assert!(handle.is_active().await?);

        handle.join_room()?;
        let before = wait_for(&mut signals, &SessionSignal::DidJoinRoom).await;
        assert_eq!(before, [SessionSignal::WillJoinRoom]);

        handle.treatment_select(2)?;
        handle.exit_session()?;
        wait_for(&mut signals, &SessionSignal::DidDisconnect).await;
        assert!(!handle.is_active().await?);

        // Give the mirror time to drain the socket.
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(())
    });

    sim.run().expect("simulation should complete");
    assert_eq!(received(&log), ["join", "treatment-select", "client-leave"]);

    let entries = log.lock().expect("log lock");
    assert_eq!(entries[0].data["room"], "ROOM42");
    assert_eq!(entries[0].data["userId"], "tester");
    assert_eq!(entries[1].data["index"], 2);
}

#[test]
fn slow_ack_within_timeout_still_pairs() {
    let mut sim = turmoil::Builder::new()
        .simulation_duration(Duration::from_secs(60))
        .min_message_latency(Duration::from_millis(200))
        .max_message_latency(Duration::from_millis(200))
        .build();
    mirror_host(&mut sim, MirrorBehavior::ack_after(Duration::from_secs(4)));

    sim.client("phone", async move {
        let (handle, _task) =
            spawn(config(), SimTransport::new(SimConnector), MemoryStore::with_room(room()));
        let mut signals = handle.subscribe();

        handle.connect()?;
        wait_for(&mut signals, &SessionSignal::DidConnect).await;
        handle.join_room()?;

        let before = wait_for(&mut signals, &SessionSignal::DidJoinRoom).await;
        assert!(!before.iter().any(|signal| matches!(signal, SessionSignal::DidError { .. })));
        Ok(())
    });

    sim.run().expect("simulation should complete");
}

#[test]
fn silent_mirror_times_out() {
    let mut sim =
        turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();
    let log = mirror_host(&mut sim, MirrorBehavior::silent());

    sim.client("phone", async move {
        let (handle, _task) =
            spawn(config(), SimTransport::new(SimConnector), MemoryStore::with_room(room()));
        let mut signals = handle.subscribe();

        handle.connect()?;
        wait_for(&mut signals, &SessionSignal::DidConnect).await;
        handle.join_room()?;
        wait_for(&mut signals, &SessionSignal::WillJoinRoom).await;
        let joined_at = Instant::now();

        let timeout = SessionSignal::DidError { message: ROOM_UNREACHABLE.to_string() };
        wait_for(&mut signals, &timeout).await;
        assert!(joined_at.elapsed() >= Duration::from_secs(5));

        let after = signals.recv().await?;
        assert_eq!(after, SessionSignal::DidDisconnect);

        let snapshot = handle.snapshot().await?;
        assert_eq!(snapshot.room, None);
        assert!(!snapshot.is_active);
        Ok(())
    });

    sim.run().expect("simulation should complete");
    assert_eq!(received(&log), ["join"]);
}

#[test]
fn unreachable_mirror_fails_connect() {
    let mut sim =
        turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();
    // The host exists but never listens.
    sim.host("mirror", || async {
        std::future::pending::<()>().await;
        Ok(())
    });

    sim.client("phone", async move {
        let (handle, _task) =
            spawn(config(), SimTransport::new(SimConnector), MemoryStore::new());
        let mut signals = handle.subscribe();

        handle.connect()?;
        let first = signals.recv().await?;
        assert_eq!(first, SessionSignal::WillConnect);
        let second = signals.recv().await?;
        assert!(matches!(second, SessionSignal::DidError { .. }), "got {second}");
        assert!(!handle.is_active().await?);
        Ok(())
    });

    sim.run().expect("simulation should complete");
}
