#![deny(unsafe_code)]

//! Shared test utilities for the strokectl workspace.
//!
//! Provides a mock control daemon, record builders, and tracing helpers so
//! that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! strokectl-test-utils = { workspace = true }
//! ```

pub mod daemon;
pub mod records;
pub mod tracing_setup;

pub use daemon::MockDaemon;
