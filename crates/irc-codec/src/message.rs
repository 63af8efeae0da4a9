//! Structured IRC messages and their textual wire form.
//!
//! ```text
//! [@tags SP] [:prefix SP] command *(SP middle) [SP :trailing]
//! ```
//!
//! Parsing is deliberately lenient: it locates the fields the relay needs
//! and nothing more. Serialization is strict, because a field that cannot be
//! represented on the wire would otherwise smuggle a second frame.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A frame that does not fit the minimal message grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message tags are empty")]
    EmptyTags,
    #[error("message prefix is empty")]
    EmptyPrefix,
    #[error("message has no command")]
    MissingCommand,
}

/// A message that cannot be written as a single wire frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("message has no command")]
    EmptyCommand,
    #[error("{field} contains a forbidden character")]
    ForbiddenChar { field: &'static str },
    #[error("parameter {index} is empty, contains a space, or starts with ':' but is not the last parameter")]
    InvalidMiddleParam { index: usize },
}

// ---------------------------------------------------------------------------
// Prefix
// ---------------------------------------------------------------------------

/// The sender identity attached to a message: `name[!user][@host]`.
///
/// `name` is a nickname or a server name. `user` is the ident, the field the
/// sanitizer normalizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl Prefix {
    /// A prefix carrying only a nick or server name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            host: None,
        }
    }

    /// A full `nick!user@host` prefix.
    pub fn full(
        name: impl Into<String>,
        user: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }

    fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.is_empty() {
            return Err(ParseError::EmptyPrefix);
        }

        let (name, user, host) = match raw.split_once('!') {
            Some((name, rest)) => match rest.split_once('@') {
                Some((user, host)) => (name, Some(user), Some(host)),
                None => (name, Some(rest), None),
            },
            None => match raw.split_once('@') {
                Some((name, host)) => (name, None, Some(host)),
                None => (raw, None, None),
            },
        };

        Ok(Self {
            name: name.to_string(),
            user: user.map(str::to_string),
            host: host.map(str::to_string),
        })
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One parsed IRC frame.
///
/// `command` is always ASCII uppercase after parsing, so lookups against it
/// can be exact. IRCv3 tags are carried verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tags: Option<String>,
    pub prefix: Option<Prefix>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: None,
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Parse a single line with its terminator already removed.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_start_matches(' ');

        let tags = match rest.strip_prefix('@') {
            Some(stripped) => {
                let (tags, tail) = split_token(stripped);
                if tags.is_empty() {
                    return Err(ParseError::EmptyTags);
                }
                rest = tail;
                Some(tags.to_string())
            }
            None => None,
        };

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (raw, tail) = split_token(stripped);
                rest = tail;
                Some(Prefix::parse(raw)?)
            }
            None => None,
        };

        let (command, mut rest) = split_token(rest);
        if command.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        let mut params = Vec::new();
        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, tail) = split_token(rest);
            params.push(param.to_string());
            rest = tail;
        }

        Ok(Self {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Render the message as a wire line, without the `\r\n` terminator.
    pub fn to_line(&self) -> Result<String, EncodeError> {
        if self.command.is_empty() {
            return Err(EncodeError::EmptyCommand);
        }
        check_token("command", &self.command)?;

        let mut line = String::with_capacity(64);

        if let Some(tags) = &self.tags {
            check_token("tags", tags)?;
            line.push('@');
            line.push_str(tags);
            line.push(' ');
        }

        if let Some(prefix) = &self.prefix {
            let rendered = prefix.to_string();
            check_token("prefix", &rendered)?;
            line.push(':');
            line.push_str(&rendered);
            line.push(' ');
        }

        line.push_str(&self.command);

        let last = self.params.len().saturating_sub(1);
        for (index, param) in self.params.iter().enumerate() {
            check_line_safe("parameter", param)?;
            let needs_colon = param.is_empty() || param.contains(' ') || param.starts_with(':');

            line.push(' ');
            if index == last {
                if needs_colon {
                    line.push(':');
                }
            } else if needs_colon {
                return Err(EncodeError::InvalidMiddleParam { index });
            }
            line.push_str(param);
        }

        Ok(line)
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split off the first space-delimited token, swallowing any run of spaces
/// that follows it.
fn split_token(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(i) => (&s[..i], s[i..].trim_start_matches(' ')),
        None => (s, ""),
    }
}

fn check_line_safe(field: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(EncodeError::ForbiddenChar { field });
    }
    Ok(())
}

fn check_token(field: &'static str, value: &str) -> Result<(), EncodeError> {
    check_line_safe(field, value)?;
    if value.contains(' ') {
        return Err(EncodeError::ForbiddenChar { field });
    }
    Ok(())
}
