// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session handling: the credential store and the inactivity monitor.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use optrack::config::SessionSettings;
//! use optrack::session::{MemoryCredentialStore, SessionMonitor};
//!
//! # async fn example() {
//! let store = Arc::new(MemoryCredentialStore::new());
//! let monitor = SessionMonitor::new(store, SessionSettings::default());
//! let mut events = monitor.subscribe();
//! monitor.start();
//!
//! // Every keystroke or command line:
//! monitor.record_activity();
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

pub mod activity;
pub mod credentials;
pub mod locks;
pub mod monitor;

pub use activity::ActivityTracker;
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use locks::{resilient_lock, resilient_read, resilient_write};
pub use monitor::{LogoutReason, SessionEvent, SessionMonitor, SessionPhase, SessionWarningState};
