//! The interactive loop.
//!
//! Reads commands line by line, forwards them to the session, and writes
//! every session signal as it arrives. Signals take priority over input so
//! the output reflects the session before the next command runs.

use mirrorlink_client::{SessionHandle, SessionSnapshot};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, warn};

use crate::{
    Result,
    commands::{HELP, ShellCommand, parse},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the shell until `/quit`, end of input, or the session stops.
pub async fn run<R, W>(handle: &SessionHandle, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut signals = handle.subscribe();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            biased;

            signal = signals.recv() => match signal {
                Ok(signal) => write_line(&mut output, &format!("signal: {signal}")).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "signal output lagging"),
                Err(RecvError::Closed) => break,
            },

            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("end of input");
                    break;
                };
                if execute(handle, parse(&line), &mut output).await? == Flow::Quit {
                    break;
                }
            },
        }
    }

    output.flush().await?;
    Ok(())
}

async fn execute<W>(handle: &SessionHandle, command: ShellCommand, output: &mut W) -> Result<Flow>
where
    W: AsyncWrite + Unpin,
{
    match command {
        ShellCommand::Connect => handle.connect()?,
        ShellCommand::Scan { room } => handle.room_scanned(room)?,
        ShellCommand::Join => handle.join_room()?,
        ShellCommand::Exit => handle.exit_session()?,
        ShellCommand::Disconnect => handle.disconnect()?,
        ShellCommand::Enable => handle.set_enabled(true)?,
        ShellCommand::Disable => handle.set_enabled(false)?,
        ShellCommand::Send(command) => handle.send(command)?,
        ShellCommand::Status => {
            let snapshot = handle.snapshot().await?;
            write_line(output, &status_line(&snapshot)).await?;
        },
        ShellCommand::Help => write_line(output, HELP).await?,
        ShellCommand::Quit => return Ok(Flow::Quit),
        ShellCommand::Empty => {},
        ShellCommand::Unknown { input } => {
            write_line(output, &format!("error: unknown command: {input} (try /help)")).await?;
        },
        ShellCommand::InvalidArgs { command, error } => {
            write_line(output, &format!("error: /{command}: {error}")).await?;
        },
    }
    Ok(Flow::Continue)
}

/// One-line rendering of a snapshot.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let room = snapshot.room.as_ref().map_or("-", |room| room.as_str());
    format!(
        "status: state={:?} active={} enabled={} room={room}",
        snapshot.state, snapshot.is_active, snapshot.enabled
    )
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use mirrorlink_core::SessionState;
    use mirrorlink_proto::RoomId;

    use super::*;

    #[test]
    fn status_without_room() {
        let snapshot = SessionSnapshot {
            state: SessionState::Idle,
            is_active: false,
            enabled: true,
            room: None,
        };
        insta::assert_snapshot!(
            status_line(&snapshot),
            @"status: state=Idle active=false enabled=true room=-"
        );
    }

    #[test]
    fn status_while_paired() {
        let snapshot = SessionSnapshot {
            state: SessionState::Paired,
            is_active: true,
            enabled: false,
            room: Some(RoomId::new("ROOM42").unwrap()),
        };
        insta::assert_snapshot!(
            status_line(&snapshot),
            @"status: state=Paired active=true enabled=false room=ROOM42"
        );
    }
}
