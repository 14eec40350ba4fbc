#![deny(unsafe_code)]

//! Stroke control-plane client core.
//!
//! Turns structured connection and CA records into single-buffer stroke
//! messages and delivers them to the IKE daemon over its Unix control socket,
//! relaying the daemon's textual response as it arrives. The pieces:
//!
//! - [`proto`] — the fixed-capacity message buffer, string packer, and typed
//!   command headers with their wire layout.
//! - [`encode`] — one builder per command, mapping records onto headers
//!   (auto-naming, rekey gating, legacy auth translation).
//! - [`transport`] — the one-shot connect/write/relay exchange with the
//!   daemon.

/// Command builders from records to sealed messages.
pub mod encode;
/// Stroke wire format: message buffer, string pool, command headers.
pub mod proto;
/// Unix-socket request/response exchange with the daemon.
pub mod transport;

pub use encode::StrokeError;
pub use proto::{MsgError, MsgKind, StringRef, StrokeMsg};
pub use transport::{DEFAULT_SOCKET_PATH, StrokeTransport, TransportError};
