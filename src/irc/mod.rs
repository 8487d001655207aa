mod client_message;
mod message;
pub mod names;
mod source;

pub use client_message::ClientMessage;
pub use message::{Message, MessageParseErr};
pub use source::Source;
