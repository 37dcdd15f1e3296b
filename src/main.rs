// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use optrack::config;
use optrack::session::{CredentialStore, FileCredentialStore};

mod cli;

use cli::{exit_code, AppContext, Cli, Commands};

fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose {
        "optrack=debug"
    } else if cli.quiet {
        "optrack=warn"
    } else {
        "optrack=info"
    };
    // -v / -q win over RUST_LOG.
    let filter = if cli.verbose || cli.quiet {
        tracing_subscriber::EnvFilter::new(default_filter)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_context(cli: &Cli) -> Result<AppContext> {
    let config = config::load_config()
        .context("Could not read ~/.optrack/config.json")?
        .with_overrides(cli.api_url.as_deref());
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::default_location()?);
    AppContext::new(config, store)
}

async fn dispatch(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Shell => cli::shell::run(ctx).await,
        other => cli::commands::run(ctx, other).await,
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() { exit_code::USAGE } else { exit_code::OK };
            std::process::exit(code);
        }
    };
    init_logging(&cli);

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprint!("{}", cli::render_error(&e).red());
            std::process::exit(exit_code::CONFIG);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} Failed to start the async runtime: {}", "[✗]".red(), e);
            std::process::exit(exit_code::FAILURE);
        }
    };

    let outcome = runtime.block_on(dispatch(&ctx, cli.command));
    // Pending spawned tasks (monitor timers) are dropped with the runtime.
    drop(runtime);

    match outcome {
        Ok(()) => std::process::exit(exit_code::OK),
        Err(e) => {
            eprint!("{}", cli::render_error(&e));
            std::process::exit(cli::exit_code_for(&e));
        }
    }
}
