//! wgmgr binary entrypoint.

use std::io;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wgmgr_cli::{execute, load_settings, Cli};
use wgmgr_core::ProcessExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("wgmgr_core=info".parse()?)
                .add_directive("wgmgr_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let settings = load_settings(&cli)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let mut stdout = io::stdout().lock();
    execute(
        cli.command,
        Arc::new(settings),
        ProcessExecutor::new(),
        &cancel,
        &mut stdout,
    )
    .await
}
