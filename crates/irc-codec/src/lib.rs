//! # irc-codec
//!
//! Framing and parsing for the IRC line protocol.
//!
//! * **[`message`]**: the structured [`Message`] / [`Prefix`] model, with a
//!   lenient parser and a strict serializer.
//! * **[`codec`]**: [`IrcCodec`], a `tokio_util` codec that turns a byte
//!   stream into messages and back.
//!
//! ```rust
//! use irc_codec::Message;
//!
//! let msg: Message = ":nick!ident@host PRIVMSG #chan :hi all".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, ["#chan", "hi all"]);
//! ```

pub mod codec;
pub mod message;

pub use codec::{CodecError, IrcCodec, DEFAULT_MAX_LINE_LENGTH};
pub use message::{EncodeError, Message, ParseError, Prefix};
