use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{ActionOutcome, PoolSession, PoolStatus, SessionSnapshot};
use ledger::{FriendbotClient, HorizonClient};
use shared::domain::{ActionKind, LogEntry};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::{JoinHandle, JoinSet},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{parse_command, Command};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "pool_cli.toml")]
    config: PathBuf,
    /// Print log entries as JSON lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = config::load_settings(&args.config)?;
    let session_config = settings.session_config()?;
    info!(
        horizon = %settings.horizon_url,
        friendbot = %settings.friendbot_url,
        network = %settings.network_passphrase,
        "pool console starting"
    );

    let session = PoolSession::new(
        Arc::new(HorizonClient::new(settings.horizon_url.clone())),
        Arc::new(FriendbotClient::new(settings.friendbot_url.clone())),
        session_config,
    );
    let printer = spawn_log_printer(session.subscribe_events(), args.json);

    println!("Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inflight = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => dispatch(&session, command, &mut inflight),
            Err(message) => println!("{message}"),
        }
        while let Some(joined) = inflight.try_join_next() {
            if let Err(err) = joined {
                warn!(error = %err, "action task failed");
            }
        }
    }

    // Requests already sent are allowed to finish.
    while let Some(joined) = inflight.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "action task failed");
        }
    }
    drop(session);
    printer.await?;
    Ok(())
}

fn dispatch(session: &Arc<PoolSession>, command: Command, inflight: &mut JoinSet<()>) {
    match command {
        Command::Generate => report(ActionKind::GenerateKeypair, session.generate_keypair()),
        Command::Fund => {
            let session = Arc::clone(session);
            inflight.spawn(async move {
                report(ActionKind::FundAccount, session.fund_account().await);
            });
        }
        Command::CreatePool => {
            let session = Arc::clone(session);
            inflight.spawn(async move {
                report(
                    ActionKind::CreateLiquidityPool,
                    session.create_liquidity_pool().await,
                );
            });
        }
        Command::Withdraw => {
            let session = Arc::clone(session);
            inflight.spawn(async move {
                report(
                    ActionKind::WithdrawFromPool,
                    session.withdraw_from_pool().await,
                );
            });
        }
        Command::Asset { name } => session.set_asset_name(name.unwrap_or_default()),
        Command::AmountA { value } => session.set_token_a_amount(value.unwrap_or_default()),
        Command::AmountB { value } => session.set_token_b_amount(value.unwrap_or_default()),
        Command::WithdrawAmount { value } => {
            session.set_withdraw_amount(value.unwrap_or_default())
        }
        Command::Status => print!("{}", render_status(&session.snapshot())),
        Command::Quit => {}
    }
}

fn report(action: ActionKind, outcome: ActionOutcome) {
    if outcome == ActionOutcome::AlreadyRunning {
        println!("{action} is already running");
    }
}

fn spawn_log_printer(mut events: broadcast::Receiver<LogEntry>, json: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(entry) => println!("{}", render_entry(&entry, json)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "log printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn render_entry(entry: &LogEntry, json: bool) -> String {
    if json {
        match serde_json::to_string(entry) {
            Ok(line) => return line,
            Err(err) => warn!(error = %err, "failed to encode log entry"),
        }
    }
    format!(
        "[{}] {}: {}",
        entry.at.format("%H:%M:%S"),
        entry.action,
        entry.message
    )
}

fn render_status(snapshot: &SessionSnapshot) -> String {
    let public_key = snapshot
        .public_key
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(none)".into());
    let pool = match snapshot.pool {
        Some(pool) => {
            let status = match pool.status {
                PoolStatus::Provisional => "provisional",
                PoolStatus::Confirmed => "confirmed",
            };
            format!("{} ({status})", pool.id)
        }
        None => "(none)".into(),
    };
    let pending = if snapshot.pending.any() {
        ActionKind::ALL
            .iter()
            .filter(|action| snapshot.pending.get(**action))
            .map(|action| format!("{action}=busy"))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        "idle".to_string()
    };
    let last_log = snapshot
        .last_log
        .as_ref()
        .map(|entry| entry.message.clone())
        .unwrap_or_default();

    format!(
        "public key      : {public_key}\n\
         pool            : {pool}\n\
         asset           : {}\n\
         amount-a        : {}\n\
         amount-b        : {}\n\
         withdraw-amount : {}\n\
         pending         : {pending}\n\
         last log        : {last_log}\n",
        snapshot.form.asset_name,
        snapshot.form.token_a_amount,
        snapshot.form.token_b_amount,
        snapshot.form.withdraw_amount,
    )
}
