// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use moneycast::config::Config;
use moneycast::services::Context;
use moneycast::store::{LocalStore, NocoClient, RecordStore, local};
use moneycast::{cli, commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MONEYCAST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(matches: &clap::ArgMatches, config: Config) -> Result<Context> {
    let Some(local_arg) = matches.get_one::<String>("local") else {
        let client = NocoClient::from_config(&config)?;
        let store: Arc<dyn RecordStore> = Arc::new(client);
        info!(backend = store.backend_tag(), "using remote store");
        return Ok(Context::new(store, config));
    };
    let path = match local_arg.trim() {
        "" => local::default_path()?,
        p => PathBuf::from(p),
    };
    let store: Arc<dyn RecordStore> = Arc::new(
        LocalStore::open(&path).with_context(|| format!("Open local store {}", path.display()))?,
    );
    info!(backend = store.backend_tag(), path = %path.display(), "using local store");
    Ok(Context::new(store, config.with_local_tables()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli::build_cli().get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        cli::build_cli().print_help()?;
        println!();
        return Ok(());
    };

    let user = matches
        .get_one::<String>("user")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .context("No user given; pass --user or set MONEYCAST_USER")?;
    let ctx = open_store(&matches, Config::load()?)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling request");
            on_signal.cancel();
        }
    });

    match name {
        "forecast" => commands::forecast::handle(&ctx, &user, sub, &cancel).await?,
        "warnings" => commands::forecast::warnings(&ctx, &user, sub, &cancel).await?,
        "subscriptions" => commands::subscriptions::handle(&ctx, &user, sub, &cancel).await?,
        "goals" => commands::goals::handle(&ctx, &user, sub, &cancel).await?,
        "budget" => commands::budgets::handle(&ctx, &user, sub, &cancel).await?,
        "installments" => commands::installments::handle(&ctx, &user, sub, &cancel).await?,
        "import" => commands::importer::handle(&ctx, &user, sub, &cancel).await?,
        "tx" => commands::transactions::handle(&ctx, &user, sub, &cancel).await?,
        "settings" => commands::settings::handle(&ctx, &user, sub, &cancel).await?,
        "anomalies" => commands::anomalies::handle(&ctx, &user, sub, &cancel).await?,
        "report" => commands::reports::handle(&ctx, &user, sub, &cancel).await?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
