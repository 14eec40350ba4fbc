//! Stroke wire format.
//!
//! A stroke message is one fixed-capacity buffer with three regions:
//!
//! ```text
//! ┌────────────────────┬──────────────────────────┬─────────────────────┐
//! │ common header      │ command header           │ string pool         │
//! │ len · kind · verb  │ scalars + string offsets │ NUL-terminated, in  │
//! │ (12 bytes)         │ (fixed layout per kind)  │ write order         │
//! └────────────────────┴──────────────────────────┴─────────────────────┘
//! 0                    12                         DATA_OFFSET    ≤ MSG_CAPACITY
//! ```
//!
//! String-valued fields hold the byte offset of their string measured from
//! the start of the message, stored in a pointer-sized slot; `0` means the
//! field is absent. The offsets are plain integers — the receiver rebases
//! them against its own copy of the buffer, never against a sender address.
//! All scalars are little-endian.

pub mod headers;
pub mod msg;

pub use headers::{AddCa, AddConn, DelCa, DelConn, End, GlobalConfig, Initiate, MsgKind, Route};
pub use msg::{DATA_OFFSET, MSG_CAPACITY, MsgError, StringRef, StrokeMsg};
