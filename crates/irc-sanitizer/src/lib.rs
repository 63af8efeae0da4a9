//! # irc-sanitizer
//!
//! Keeps relayed IRC messages inside the protocol's grammar limits.
//!
//! Two layers:
//!
//! 1. **[`rules`]**: the static command table mapping each sanitized
//!    command to a [`Rule`].
//! 2. **[`sanitizer`]**: the field rewrites ([`normalize_identifier`],
//!    [`clamp_body`]) and [`sanitize`], which applies the prefix rewrite and
//!    the command's rule to one message.
//!
//! ## Quick start
//!
//! ```rust
//! use irc_codec::Message;
//! use irc_sanitizer::{sanitize, STANDARD_RULES};
//!
//! let msg: Message = ":n!id~x@host NICK :new nick".parse().unwrap();
//! let msg = sanitize(msg, &STANDARD_RULES).unwrap();
//! assert_eq!(msg.prefix.unwrap().user.as_deref(), Some("id_x"));
//! assert_eq!(msg.params, ["new_nick"]);
//! ```

pub mod rules;
pub mod sanitizer;

pub use rules::{Rule, RuleTable, SanitizeError, STANDARD_RULES};
pub use sanitizer::{clamp_body, normalize_identifier, sanitize, MAX_BODY_LEN};
