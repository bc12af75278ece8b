//! vizcheck session orchestration
//!
//! This crate drives one visual-regression test against a remote comparison
//! service:
//! - Opens a test and lazily starts the remote session
//! - Runs checkpoints through a match-retry protocol
//! - Records user-input triggers relative to the last screenshot
//! - Classifies end-of-session data into pass/fail/new/aborted results
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SessionController                                       │
//! │    ├── open() / close() / abort_if_not_closed()          │
//! │    ├── check_window() ──▶ MatchProtocol (per checkpoint) │
//! │    ├── add_*_trigger() ──▶ TriggerRecorder               │
//! │    └── close() ──▶ classify() ──▶ build_test_error()     │
//! ├──────────────────────────────────────────────────────────┤
//! │  Collaborators                                           │
//! │    ├── ServerConnector (comparison service)              │
//! │    └── AppDriver (screenshots, title, viewport)          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod connector;
pub mod controller;
pub mod driver;
pub mod logging;
pub mod match_task;
pub mod reporter;
pub mod triggers;

pub use classifier::classify;
pub use config::SessionConfig;
pub use connector::ServerConnector;
pub use controller::{MatchProtocolFactory, SessionController};
pub use driver::{AppDriver, Screenshot};
pub use match_task::{MatchProtocol, MatchRequest, MatchWindowTask};
pub use reporter::build_test_error;
pub use triggers::TriggerRecorder;
