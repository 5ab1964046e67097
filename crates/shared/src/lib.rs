//! Shared types for the lexdesk client: broadcaster wire protocol,
//! notification payloads and error envelopes.

pub mod error;
pub mod notification;
pub mod protocol;

pub use error::*;
pub use notification::*;
pub use protocol::*;
