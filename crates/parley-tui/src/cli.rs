//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use parley_client::{AuthPlacement, DEFAULT_WS_BASE, SendMode, SessionConfig};

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Two-party chat over the Parley backend")]
#[command(version)]
pub struct Args {
    /// REST API base URL
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub api: String,

    /// Socket base URL; the room name is appended per chat
    #[arg(long, default_value = DEFAULT_WS_BASE)]
    pub ws: String,

    /// Username to log in with
    #[arg(short, long)]
    pub username: String,

    /// Password to log in with
    #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// How sent messages reach the local view
    #[arg(long, value_enum, default_value_t = SendModeArg::Optimistic)]
    pub send_mode: SendModeArg,

    /// Where the token travels when opening the socket
    #[arg(long, value_enum, default_value_t = AuthArg::Query)]
    pub auth: AuthArg,

    /// Idle time in milliseconds before peers are told typing stopped
    #[arg(long, default_value_t = 3000)]
    pub typing_timeout_ms: u64,

    /// File to write logs to
    #[arg(long, default_value = "parley.log")]
    pub log_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// What to do after logging in
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List users you can chat with
    Users,
    /// Open the chat screen
    Chat {
        /// User id to open a chat with right away
        #[arg(short, long)]
        peer: Option<u64>,
    },
    /// Store a message without opening the chat socket
    Send {
        /// Recipient user id
        #[arg(long)]
        to: u64,
        /// Message text
        text: String,
    },
}

/// `--send-mode` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendModeArg {
    /// Show sent messages at once, confirm on echo
    Optimistic,
    /// Show sent messages only when the server broadcasts them
    EchoTrust,
}

/// `--auth` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthArg {
    /// `?token=` query parameter
    Query,
    /// `Authorization: Bearer` header
    Header,
}

impl Args {
    /// Session settings from the flags.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ws_base: self.ws.clone(),
            send_mode: match self.send_mode {
                SendModeArg::Optimistic => SendMode::Optimistic,
                SendModeArg::EchoTrust => SendMode::EchoTrust,
            },
            auth_placement: match self.auth {
                AuthArg::Query => AuthPlacement::Query,
                AuthArg::Header => AuthPlacement::Header,
            },
            typing_timeout: Duration::from_millis(self.typing_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("parley").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_backend() {
        let args = parse(&["-u", "ana", "--password", "pw", "chat"]);
        assert_eq!(args.command, Command::Chat { peer: None });
        assert_eq!(args.session_config(), SessionConfig::default());
    }

    #[test]
    fn flags_map_to_session_config() {
        let args = parse(&[
            "-u",
            "ana",
            "--password",
            "pw",
            "--ws",
            "wss://chat.example/ws/chat",
            "--send-mode",
            "echo-trust",
            "--auth",
            "header",
            "--typing-timeout-ms",
            "1500",
            "chat",
            "--peer",
            "7",
        ]);

        let config = args.session_config();
        assert_eq!(config.ws_base, "wss://chat.example/ws/chat");
        assert_eq!(config.send_mode, SendMode::EchoTrust);
        assert_eq!(config.auth_placement, AuthPlacement::Header);
        assert_eq!(config.typing_timeout, Duration::from_millis(1500));
        assert_eq!(args.command, Command::Chat { peer: Some(7) });
    }

    #[test]
    fn users_subcommand() {
        let args = parse(&["-u", "ana", "--password", "pw", "users"]);
        assert_eq!(args.command, Command::Users);
    }

    #[test]
    fn send_subcommand() {
        let args = parse(&["-u", "ana", "--password", "pw", "send", "--to", "7", "hello there"]);
        assert_eq!(args.command, Command::Send { to: 7, text: "hello there".to_string() });
    }
}
