// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Terminal front end: argument parsing, command handlers and the
//! interactive shell with inactivity auto-logout.
//!
//! One-shot invocations (`optrack teams list`) go straight to
//! [`commands::run`]. `optrack shell` starts [`shell::run`], which parses each
//! typed line with the same clap definitions and hands it to the same
//! handlers while a [`optrack::session::SessionMonitor`] watches for idle time.

pub mod args;
pub mod commands;
pub mod input;
pub mod shell;
pub mod spinner;
pub mod table;

pub use args::{Cli, Commands};
pub use commands::{render_error, AppContext};

use optrack::error::ApiError;
use optrack::validation::ValidationErrors;

use commands::{Cancelled, InvalidInput, NotLoggedIn};

/// Process exit codes (sysexits.h values).
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 64;
    pub const DATA: i32 = 65;
    pub const UNAVAILABLE: i32 = 69;
    pub const NO_PERMISSION: i32 = 77;
    pub const CONFIG: i32 = 78;
}

/// Map a command failure to its exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<NotLoggedIn>().is_some() {
        return exit_code::NO_PERMISSION;
    }
    if err.downcast_ref::<InvalidInput>().is_some() || err.downcast_ref::<ValidationErrors>().is_some() {
        return exit_code::DATA;
    }
    if err.downcast_ref::<Cancelled>().is_some() {
        return exit_code::FAILURE;
    }
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Network(_)) => exit_code::UNAVAILABLE,
        Some(ApiError::Unauthorized) => exit_code::NO_PERMISSION,
        Some(ApiError::InvalidUrl(_)) => exit_code::CONFIG,
        Some(ApiError::Status { status, .. }) if *status < 500 => exit_code::DATA,
        Some(ApiError::Status { .. }) => exit_code::UNAVAILABLE,
        Some(_) => exit_code::FAILURE,
        None => exit_code::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&anyhow::Error::new(NotLoggedIn)), exit_code::NO_PERMISSION);

        let network: anyhow::Result<()> = Err(ApiError::Network("refused".into()).into());
        let err = network.context("Could not load products").unwrap_err();
        assert_eq!(exit_code_for(&err), exit_code::UNAVAILABLE);

        let rejected = anyhow::Error::new(ApiError::Status { status: 400, message: None });
        assert_eq!(exit_code_for(&rejected), exit_code::DATA);

        let invalid = anyhow::Error::new(ValidationErrors::single("op", "is required"));
        assert_eq!(exit_code_for(&invalid), exit_code::DATA);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), exit_code::FAILURE);
    }
}
