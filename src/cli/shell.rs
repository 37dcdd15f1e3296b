// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interactive shell with inactivity auto-logout.
//!
//! Every typed line counts as activity. When the session monitor decides the
//! user has been idle too long it shows a warning; from then on only
//! `continue`, `logout` and `exit` are accepted until the warning is answered
//! or the countdown logs the session out.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use optrack::session::{LogoutReason, SessionEvent, SessionMonitor, SessionPhase};
use optrack::utils::split_args;

use super::args::{Commands, ShellCommand, ShellLine};
use super::commands::{self, render_error, AppContext};
use super::input::{InputLine, LineReader};

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

fn prompt_for(phase: SessionPhase) -> String {
    match phase {
        SessionPhase::Active => format!("{} ", "optrack>".cyan().bold()),
        SessionPhase::WarningShown => format!("{} ", "optrack (expiring)>".yellow().bold()),
        SessionPhase::LoggedOut => format!("{} ", "optrack (logged out)>".dimmed()),
    }
}

/// `1800s` -> `30m 0s`, `45s` -> `45s`.
fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

fn announce(event: &SessionEvent, monitor: &SessionMonitor) {
    match event {
        SessionEvent::WarningShown { inactive, .. } => {
            let remaining = monitor.warning().remaining().unwrap_or_default();
            println!();
            println!("{}", "[!] Session about to expire".yellow().bold());
            println!("    No activity for {}.", human_duration(*inactive));
            println!("    You will be logged out in {}.", human_duration(remaining));
            println!("    Type {} to stay logged in or {} to leave now.", "continue".bold(), "logout".bold());
        }
        SessionEvent::Continued => println!("{} Session continued.", "[OK]".green()),
        SessionEvent::LoggedOut { reason } => {
            let message = match reason {
                LogoutReason::AutoLogout => "Logged out after inactivity.",
                LogoutReason::Explicit => "Logged out.",
                LogoutReason::CredentialsMissing => "Session ended: stored credentials were removed.",
            };
            println!();
            println!("{} {}", "[i]".red().bold(), message);
            println!("    Type {} to start a new session.", "login".bold());
        }
    }
}

/// Print whatever the monitor published while the last command ran.
fn drain_events(events: &mut broadcast::Receiver<SessionEvent>, monitor: &SessionMonitor) {
    loop {
        match events.try_recv() {
            Ok(event) => announce(&event, monitor),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!("Skipped {} session events", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn print_banner(monitor: &SessionMonitor) {
    println!("{}", "optrack shell".bold());
    println!("Type {} for commands, {} to leave.", "help".bold(), "exit".bold());
    let settings = monitor.settings();
    println!(
        "Sessions expire after {} idle plus {} to confirm.",
        human_duration(settings.warning_after()),
        human_duration(settings.auto_logout_after())
    );
    if monitor.phase() == SessionPhase::LoggedOut {
        println!("You are not logged in. Type {} to start.", "login".bold());
    }
    println!();
}

/// Run the shell until `exit` or end of input.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let monitor = SessionMonitor::new(ctx.store.clone(), ctx.config.session.clone());
    let mut events = monitor.subscribe();
    monitor.start();

    let mut reader = LineReader::spawn()?;
    print_banner(&monitor);

    loop {
        drain_events(&mut events, &monitor);
        reader.request(prompt_for(monitor.phase()));

        let line = loop {
            tokio::select! {
                line = reader.next() => break line,
                event = events.recv() => match event {
                    Ok(event) => announce(&event, &monitor),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Skipped {} session events", skipped);
                    }
                    Err(RecvError::Closed) => events = monitor.subscribe(),
                },
            }
        };

        match line {
            InputLine::Line(text) => {
                monitor.record_activity();
                if handle_line(ctx, &monitor, &text).await == Flow::Exit {
                    break;
                }
            }
            InputLine::Eof => break,
            InputLine::Failed(e) => {
                eprintln!("{}", format!("[✗] Input error: {}", e).red());
                break;
            }
        }
    }

    monitor.stop();
    println!("Bye.");
    Ok(())
}

async fn handle_line(ctx: &AppContext, monitor: &SessionMonitor, text: &str) -> Flow {
    let words = split_args(text);
    if words.is_empty() {
        return Flow::Continue;
    }

    let parsed = match ShellLine::try_parse_from(&words) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Also covers `help` and `--help`.
            let _ = e.print();
            return Flow::Continue;
        }
    };

    match (monitor.phase(), parsed.command) {
        (_, ShellCommand::Exit) => Flow::Exit,

        (SessionPhase::WarningShown, ShellCommand::Continue) => {
            monitor.continue_session();
            Flow::Continue
        }
        (SessionPhase::Active, ShellCommand::Continue) => {
            println!("Session is active.");
            Flow::Continue
        }
        (SessionPhase::LoggedOut, ShellCommand::Continue) => {
            println!("There is no session to continue. Type {} first.", "login".bold());
            Flow::Continue
        }

        (_, ShellCommand::App(Commands::Logout)) => {
            if monitor.phase() == SessionPhase::LoggedOut {
                println!("Not logged in.");
            }
            monitor.logout();
            Flow::Continue
        }

        (SessionPhase::WarningShown, ShellCommand::App(_)) => {
            let remaining = monitor.warning().remaining().unwrap_or_default();
            println!(
                "{} Session expires in {}. Type {} or {}.",
                "[!]".yellow().bold(),
                human_duration(remaining),
                "continue".bold(),
                "logout".bold()
            );
            Flow::Continue
        }

        (_, ShellCommand::App(Commands::Shell)) => {
            println!("Already in the shell.");
            Flow::Continue
        }

        (_, ShellCommand::App(command @ Commands::Login { .. })) => {
            match commands::run(ctx, command).await {
                Ok(()) => monitor.reset(),
                Err(e) => eprint!("{}", render_error(&e)),
            }
            Flow::Continue
        }

        (SessionPhase::LoggedOut, ShellCommand::App(_)) => {
            println!("You are logged out. Type {} to start a new session.", "login".bold());
            Flow::Continue
        }

        (SessionPhase::Active, ShellCommand::App(command)) => {
            run_command(ctx, command).await;
            Flow::Continue
        }
    }
}

async fn run_command(ctx: &AppContext, command: Commands) {
    if let Err(e) = commands::run(ctx, command).await {
        eprint!("{}", render_error(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optrack::config::{AppConfig, SessionSettings};
    use optrack::session::{CredentialStore, Credentials, MemoryCredentialStore};
    use std::sync::Arc;

    fn context(logged_in: bool) -> AppContext {
        let store: Arc<dyn CredentialStore> = if logged_in {
            Arc::new(MemoryCredentialStore::with_credentials(Credentials::new("tok", Some("ana".into()))))
        } else {
            Arc::new(MemoryCredentialStore::new())
        };
        let config = AppConfig {
            session: SessionSettings { warning_after_secs: 60, auto_logout_after_secs: 30, poll_interval_secs: 10 },
            ..AppConfig::default()
        };
        AppContext::new(config, store).unwrap()
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(Duration::from_secs(45)), "45s");
        assert_eq!(human_duration(Duration::from_secs(1800)), "30m 0s");
        assert_eq!(human_duration(Duration::from_secs(305)), "5m 5s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_blocks_commands_until_continue() {
        let ctx = context(true);
        let monitor = SessionMonitor::new(ctx.store.clone(), ctx.config.session.clone());
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        assert_eq!(monitor.phase(), SessionPhase::WarningShown);

        // Gated: does not reach the network, phase unchanged.
        assert_eq!(handle_line(&ctx, &monitor, "teams list").await, Flow::Continue);
        assert_eq!(monitor.phase(), SessionPhase::WarningShown);

        handle_line(&ctx, &monitor, "continue").await;
        assert_eq!(monitor.phase(), SessionPhase::Active);
    }

    #[tokio::test]
    async fn test_logout_and_exit() {
        let ctx = context(true);
        let monitor = SessionMonitor::new(ctx.store.clone(), ctx.config.session.clone());

        assert_eq!(handle_line(&ctx, &monitor, "logout").await, Flow::Continue);
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);
        assert!(!ctx.store.is_authenticated());

        assert_eq!(handle_line(&ctx, &monitor, "   ").await, Flow::Continue);
        assert_eq!(handle_line(&ctx, &monitor, "quit").await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_logged_out_refuses_app_commands() {
        let ctx = context(false);
        let monitor = SessionMonitor::new(ctx.store.clone(), ctx.config.session.clone());
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);

        // Gated before any request is made.
        assert_eq!(handle_line(&ctx, &monitor, "teams list").await, Flow::Continue);
        assert_eq!(handle_line(&ctx, &monitor, "continue").await, Flow::Continue);
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);
        assert!(!ctx.store.is_authenticated());
    }
}
