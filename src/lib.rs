// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! optrack - production order (OP) tracking client library
//!
//! Talks to the production-order REST backend and keeps an interactive
//! session honest about inactivity.
//!
//! # Core Modules
//!
//! - [`api`] - REST client: auth, products, teams, users, reports
//! - [`session`] - Credential store and the inactivity monitor
//! - [`validation`] - Form rules for products, teams, users and schedules
//! - [`export`] - Per-OP text report
//! - [`sizes`] - Size catalogue and size summaries
//! - [`pagination`] - Page arithmetic for listings
//! - [`config`] - `~/.optrack/config.json`
//! - [`error`] - API errors and consistent error formatting

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod pagination;
pub mod session;
pub mod sizes;
pub mod types;
pub mod utils;
pub mod validation;

pub use api::ApiClient;
pub use config::{AppConfig, SessionSettings};
pub use error::{ApiError, ApiResult};
pub use session::{CredentialStore, Credentials, SessionEvent, SessionMonitor, SessionPhase};
pub use types::{Product, ReportSchedule, Role, Team, User};
