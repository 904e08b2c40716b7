//! # goldleaf-core
//!
//! Core library for goldleaf - a personal task and habit tracker with a
//! gold economy.
//!
//! This library provides:
//! - Domain types for profiles, tasks, streak rules, and the audit log
//! - A recurring-period calculator for dailies and habit counter resets
//! - The four atomic task actions (habit increment, daily complete,
//!   todo complete, reward claim)
//! - New-day rollover for missed daily periods
//! - Dual storage backends (local SQLite, remote HTTP) behind one
//!   [`Repository`](store::Repository) contract
//! - An activity timer producing duration log entries
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use goldleaf_core::{store, Config};
//!
//! // Load configuration and open the configured backend
//! let config = Config::load().expect("failed to load config");
//! let repo = store::open(&config).expect("failed to open storage");
//!
//! let profiles = repo.fetch_profiles().expect("failed to list profiles");
//! for profile in profiles {
//!     println!("{}: {} gold", profile.name, profile.gold_balance);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use store::{LocalStore, RemoteStore, Repository};
pub use timer::{ActivityTimer, TimerState};
pub use types::*;

// Public modules
pub mod actions;
pub mod config;
pub mod error;
pub mod logging;
pub mod periods;
pub mod rollover;
pub mod store;
pub mod timer;
pub mod types;
