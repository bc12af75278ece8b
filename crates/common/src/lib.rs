//! vizcheck Common Library
//!
//! Shared data model, geometry primitives and error taxonomy for visual
//! checkpoint sessions.

pub mod error;
pub mod geometry;
pub mod types;

// Re-export commonly used types
pub use error::{Error, FailureKind, Result, TestFailure};
pub use geometry::{Location, Region, RectangleSize};
pub use types::*;

/// vizcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
