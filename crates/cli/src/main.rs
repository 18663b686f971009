use std::{net::SocketAddr, process::ExitCode};

use clap::Parser;
use store::{AuthHandle, Credential, TransactionStore};

use crate::{
    commands::{Command, ServeArgs},
    config::{ConfigArgs, Settings},
    error::{AppError, Result},
};

mod commands;
mod config;
mod error;

#[derive(Debug, Parser)]
#[command(name = "fintrack")]
#[command(about = "Track income, expenses and personal credit")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match config::load(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fintrack={level},store={level},server={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, settings: Settings) -> Result<()> {
    match command {
        Command::List(args) => commands::list(&connect(settings)?, args).await,
        Command::Stats => commands::stats(&connect(settings)?).await,
        Command::Add(args) => commands::add(&connect(settings)?, args).await,
        Command::Update(args) => commands::update(&connect(settings)?, args).await,
        Command::Delete { id } => commands::delete(&connect(settings)?, &id).await,
        Command::Serve(args) => serve(args, settings).await,
    }
}

fn connect(settings: Settings) -> Result<TransactionStore> {
    let auth = match settings.auth {
        Some(auth) => AuthHandle::with_credential(Credential::new(auth.user_id, auth.token)),
        None => {
            tracing::warn!("no auth token configured, set FINTRACK_AUTH__TOKEN");
            AuthHandle::new()
        }
    };
    Ok(TransactionStore::connect(settings.store, auth.subscribe())?)
}

async fn serve(args: ServeArgs, settings: Settings) -> Result<()> {
    let server_settings = settings.server;
    if server_settings.users.is_empty() {
        return Err(AppError::Usage(
            "no users configured, add [[server.users]] entries".to_string(),
        ));
    }

    let bind = args.bind.unwrap_or(server_settings.bind);
    let port = args.port.unwrap_or(server_settings.port);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|err| AppError::Usage(format!("invalid bind address {bind}:{port}: {err}")))?;

    let state = server::ServerState::new(
        server::Ledger::new(),
        server_settings
            .users
            .into_iter()
            .map(|user| (user.token, user.user_id)),
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(state, listener).await?;
    Ok(())
}
