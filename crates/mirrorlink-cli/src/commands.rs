//! Command parsing for the line-oriented shell.
//!
//! This module parses input lines into structured [`ShellCommand`] values.

use mirrorlink_proto::{Command, RoomId};

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Connect to the mirror server.
    Connect,

    /// Simulate scanning a room QR code.
    Scan {
        /// Scanned room.
        room: RoomId,
    },

    /// Join the stored room.
    Join,

    /// Leave the room and disconnect.
    Exit,

    /// Disconnect and forget the room.
    Disconnect,

    /// Allow scan-initiated pairing.
    Enable,

    /// Block scan-initiated pairing.
    Disable,

    /// Send a selection command to the mirror.
    Send(Command),

    /// Print the session state.
    Status,

    /// Print the command list.
    Help,

    /// Quit the application.
    Quit,

    /// Blank line.
    Empty,

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Command list shown by `/help`.
pub const HELP: &str = "\
/connect              open the connection
/scan <room>          scan a room code (connects and joins)
/join                 join the stored room
/exit                 leave the room and disconnect
/disconnect           disconnect and forget the room
/enable, /disable     allow or block scan pairing
/product <index>      select a product
/tea <index>          select a tea
/order <json>         order tea
/treatment <index>    select a treatment
/view <json>          view a treatment
/status               show the session state
/quit                 exit";

/// Parse a user input line into a command.
///
/// Commands start with `/`. JSON arguments take the rest of the line.
pub fn parse(input: &str) -> ShellCommand {
    let input = input.trim();

    if input.is_empty() {
        return ShellCommand::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return ShellCommand::Unknown { input: input.to_string() };
    };

    let (command, rest) = match cmd_str.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (cmd_str, ""),
    };

    match command {
        "connect" => ShellCommand::Connect,

        "scan" => match RoomId::new(rest) {
            Ok(room) => ShellCommand::Scan { room },
            Err(_) => invalid("scan", "Usage: /scan <room>"),
        },

        "join" => ShellCommand::Join,
        "exit" | "leave" => ShellCommand::Exit,
        "disconnect" => ShellCommand::Disconnect,
        "enable" => ShellCommand::Enable,
        "disable" => ShellCommand::Disable,

        "product" => index("product", rest, |index| Command::ProductSelect { index }),
        "tea" => index("tea", rest, |index| Command::TeaSelect { index }),
        "treatment" => index("treatment", rest, |index| Command::TreatmentSelect { index }),

        "order" => json("order", rest, |data| Command::TeaOrder { data }),
        "view" => json("view", rest, |data| Command::ViewTreatment { data }),

        "status" => ShellCommand::Status,
        "help" | "h" => ShellCommand::Help,
        "quit" | "q" => ShellCommand::Quit,

        _ => ShellCommand::Unknown { input: input.to_string() },
    }
}

fn index(name: &str, arg: &str, build: impl FnOnce(u32) -> Command) -> ShellCommand {
    if arg.is_empty() {
        return invalid(name, &format!("Usage: /{name} <index>"));
    }
    match arg.parse::<u32>() {
        Ok(index) => ShellCommand::Send(build(index)),
        Err(_) => invalid(name, "Invalid index"),
    }
}

fn json(name: &str, arg: &str, build: impl FnOnce(String) -> Command) -> ShellCommand {
    if arg.is_empty() {
        return invalid(name, &format!("Usage: /{name} <json>"));
    }
    match serde_json::from_str::<serde_json::Value>(arg) {
        Ok(_) => ShellCommand::Send(build(arg.to_string())),
        Err(error) => invalid(name, &format!("Invalid JSON: {error}")),
    }
}

fn invalid(command: &str, error: &str) -> ShellCommand {
    ShellCommand::InvalidArgs { command: command.into(), error: error.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_connect() {
        assert_eq!(parse("/connect"), ShellCommand::Connect);
    }

    #[test]
    fn parse_scan() {
        let room = RoomId::new("ROOM42").unwrap();
        assert_eq!(parse("/scan ROOM42"), ShellCommand::Scan { room });
    }

    #[test]
    fn parse_scan_missing_room() {
        assert!(
            matches!(parse("/scan"), ShellCommand::InvalidArgs { command, .. } if command == "scan")
        );
    }

    #[test]
    fn parse_selection() {
        assert_eq!(parse("/product 3"), ShellCommand::Send(Command::ProductSelect { index: 3 }));
        assert_eq!(parse("/tea 0"), ShellCommand::Send(Command::TeaSelect { index: 0 }));
        assert_eq!(
            parse("/treatment 12"),
            ShellCommand::Send(Command::TreatmentSelect { index: 12 })
        );
    }

    #[test]
    fn parse_bad_index() {
        assert!(matches!(
            parse("/product -1"),
            ShellCommand::InvalidArgs { command, .. } if command == "product"
        ));
        assert!(matches!(parse("/tea"), ShellCommand::InvalidArgs { .. }));
    }

    #[test]
    fn parse_json_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse(r#"/order {"tea": "green", "size": 2}"#),
            ShellCommand::Send(Command::TeaOrder { data: r#"{"tea": "green", "size": 2}"#.into() })
        );
        assert!(matches!(parse("/view {oops"), ShellCommand::InvalidArgs { .. }));
    }

    #[test]
    fn parse_lifecycle() {
        assert_eq!(parse("/join"), ShellCommand::Join);
        assert_eq!(parse("/exit"), ShellCommand::Exit);
        assert_eq!(parse("/disconnect"), ShellCommand::Disconnect);
        assert_eq!(parse("/enable"), ShellCommand::Enable);
        assert_eq!(parse("/disable"), ShellCommand::Disable);
        assert_eq!(parse("/status"), ShellCommand::Status);
    }

    #[test]
    fn parse_quit() {
        assert_eq!(parse("/quit"), ShellCommand::Quit);
        assert_eq!(parse("/q"), ShellCommand::Quit);
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse("/unknown"), ShellCommand::Unknown { .. }));
        assert!(matches!(parse("hello"), ShellCommand::Unknown { .. }));
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse("   "), ShellCommand::Empty);
    }
}
