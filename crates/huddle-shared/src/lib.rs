//! # huddle-shared
//!
//! Types shared between the Huddle chat server and its clients: identifier
//! newtypes, the JSON wire protocol (client commands and server events), the
//! hydrated view structs pushed over the wire, and protocol constants.

pub mod constants;
pub mod protocol;
pub mod types;

pub use protocol::{
    ClientCommand, CommentView, MessageView, PresenceView, ReactionKind, SenderView, ServerEvent,
};
pub use types::{MessageId, SessionId, UserId};
