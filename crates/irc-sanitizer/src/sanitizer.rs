//! Field rewrites and the per-message entry point that applies them.

use irc_codec::Message;
use tracing::trace;

use crate::rules::{RuleTable, SanitizeError};

/// Maximum length of a message body, in bytes.
///
/// Not full line-length compliance: the limit counts the bytes of one
/// parameter and ignores the rest of the line.
pub const MAX_BODY_LEN: usize = 512;

/// Punctuation allowed in identifiers besides ASCII letters and digits.
const IDENTIFIER_PUNCTUATION: &[char] = &['-', '[', ']', '\\', '`', '_', '^', '{', '|', '}'];

/// Replacement for every disallowed identifier character.
const REPLACEMENT: char = '_';

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || IDENTIFIER_PUNCTUATION.contains(&c)
}

/// Map every character outside the nickname character set to `_`.
///
/// The output has exactly as many characters as the input.
pub fn normalize_identifier(ident: &str) -> String {
    ident
        .chars()
        .map(|c| if is_identifier_char(c) { c } else { REPLACEMENT })
        .collect()
}

/// Truncate `body` to at most [`MAX_BODY_LEN`] bytes.
///
/// A multi-byte character straddling the limit is dropped whole, so the
/// result may be up to three bytes short of the limit.
pub fn clamp_body(body: &str) -> String {
    if body.len() <= MAX_BODY_LEN {
        return body.to_string();
    }
    let mut cut = MAX_BODY_LEN;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body[..cut].to_string()
}

/// Sanitize one decoded message, taking ownership and handing it back ready
/// to encode.
///
/// The prefix ident is normalized whenever a prefix carries one; then the
/// command's rule from `rules`, if any, is applied. On error the message is
/// consumed and must not be forwarded.
pub fn sanitize(mut msg: Message, rules: &RuleTable) -> Result<Message, SanitizeError> {
    if let Some(user) = msg.prefix.as_mut().and_then(|p| p.user.as_mut()) {
        let normalized = normalize_identifier(user);
        if normalized != *user {
            trace!(from = %user, to = %normalized, "normalized prefix ident");
            *user = normalized;
        }
    }

    if let Some(rule) = rules.lookup(&msg.command) {
        rule.apply(&msg.command, &mut msg.params)?;
        trace!(command = %msg.command, %rule, "applied command rule");
    }

    Ok(msg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
