//! Parley terminal client entry point.

use std::io::{Write, stdout};

use clap::Parser;
use parley_client::{Identity, api::ApiClient};
use parley_tui::{
    Runtime, SystemEnv, TerminalDriver, TuiError,
    cli::{Args, Command},
    logging,
};

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let args = Args::parse();
    logging::init(&args.log_file, &args.log_level)?;

    let mut api = ApiClient::new(&args.api)?;
    let login = api.login(&args.username, &args.password).await?;
    let identity = Identity::new(login.user.id, login.user.username);
    let config = args.session_config();

    match args.command {
        Command::Users => {
            let users = api.users().await?;
            let mut out = stdout().lock();
            for user in users.iter().filter(|u| u.id != identity.user_id) {
                writeln!(out, "{:>6}  {}", user.id, user.username)?;
            }
        },
        Command::Send { to, text } => {
            let record = api.send_message(to, &text).await?;
            writeln!(stdout().lock(), "stored message {}", record.id)?;
        },
        Command::Chat { peer } => {
            if let Some(peer) = peer {
                // Unknown ids fail here instead of on a socket the server refuses.
                let user = api.user(peer).await?;
                tracing::info!(peer, username = %user.username, "opening chat");
            }
            let driver = TerminalDriver::new(api)?;
            let runtime = Runtime::new(driver, SystemEnv, identity, config, Some(login.token));
            runtime.run(peer).await?;
        },
    }

    Ok(())
}
