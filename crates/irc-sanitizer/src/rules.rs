//! Command rule table.
//!
//! Maps canonical (uppercase) command tokens to the single [`Rule`] applied
//! to that command's parameters. The table is a static slice: it is fixed at
//! compile time and shared read-only by every session.

use std::fmt;

use thiserror::Error;

use crate::sanitizer::{clamp_body, normalize_identifier};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A message that does not have the shape its command's rule requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("not enough parameters for {command}: need {required}, got {found}")]
    NotEnoughParams {
        command: String,
        required: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// How a command's parameters are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Parameter 0 is an identifier and is normalized.
    Identifier,
    /// Parameter 1 is a message body and is clamped.
    Body,
}

impl Rule {
    /// Minimum number of parameters the rule needs to find its target.
    pub fn required_params(self) -> usize {
        match self {
            Self::Identifier => 1,
            Self::Body => 2,
        }
    }

    /// Rewrite `params` in place.
    ///
    /// Takes a slice so a rule can change parameter contents but never the
    /// parameter count.
    pub fn apply(self, command: &str, params: &mut [String]) -> Result<(), SanitizeError> {
        let required = self.required_params();
        if params.len() < required {
            return Err(SanitizeError::NotEnoughParams {
                command: command.to_string(),
                required,
                found: params.len(),
            });
        }

        let target = &mut params[required - 1];
        let rewritten = match self {
            Self::Identifier => normalize_identifier(target),
            Self::Body => clamp_body(target),
        };
        *target = rewritten;
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Body => write!(f, "body"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An immutable command-to-rule mapping.
#[derive(Debug)]
pub struct RuleTable {
    entries: &'static [(&'static str, Rule)],
}

impl RuleTable {
    pub const fn new(entries: &'static [(&'static str, Rule)]) -> Self {
        Self { entries }
    }

    /// Look up the rule for a canonical command token. Matching is exact and
    /// case-sensitive.
    pub fn lookup(&self, command: &str) -> Option<Rule> {
        self.entries
            .iter()
            .find(|(name, _)| *name == command)
            .map(|(_, rule)| *rule)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The rule table used by the relay.
pub static STANDARD_RULES: RuleTable = RuleTable::new(&[
    ("NICK", Rule::Identifier),
    ("MODE", Rule::Identifier),
    ("SERVICE", Rule::Identifier),
    ("INVITE", Rule::Identifier),
    ("PRIVMSG", Rule::Body),
    ("NOTICE", Rule::Body),
]);

#[cfg(test)]
mod tests {
    use super::*;

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn standard_table_contents() {
        for cmd in ["NICK", "MODE", "SERVICE", "INVITE"] {
            assert_eq!(STANDARD_RULES.lookup(cmd), Some(Rule::Identifier), "{cmd}");
        }
        for cmd in ["PRIVMSG", "NOTICE"] {
            assert_eq!(STANDARD_RULES.lookup(cmd), Some(Rule::Body), "{cmd}");
        }
        assert_eq!(STANDARD_RULES.len(), 6);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(STANDARD_RULES.lookup("privmsg"), None);
        assert_eq!(STANDARD_RULES.lookup("Nick"), None);
        assert_eq!(STANDARD_RULES.lookup("JOIN"), None);
    }

    #[test]
    fn command_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (name, _) in STANDARD_RULES.entries {
            assert!(seen.insert(*name), "duplicate command: {name}");
        }
    }

    #[test]
    fn identifier_rule_rewrites_first_param_only() {
        let mut p = params(&["b@d nick", "rest of it"]);
        Rule::Identifier.apply("NICK", &mut p).unwrap();
        assert_eq!(p, params(&["b_d_nick", "rest of it"]));
    }

    #[test]
    fn body_rule_clamps_second_param_only() {
        let long = "x".repeat(700);
        let mut p = params(&["#c h", &long]);
        Rule::Body.apply("PRIVMSG", &mut p).unwrap();
        assert_eq!(p[0], "#c h");
        assert_eq!(p[1].len(), 512);
    }

    #[test]
    fn identifier_rule_needs_one_param() {
        let mut p: Vec<String> = Vec::new();
        assert_eq!(
            Rule::Identifier.apply("NICK", &mut p),
            Err(SanitizeError::NotEnoughParams {
                command: "NICK".into(),
                required: 1,
                found: 0,
            })
        );
    }

    #[test]
    fn body_rule_needs_two_params() {
        let mut p = params(&["#chan"]);
        let err = Rule::Body.apply("NOTICE", &mut p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "not enough parameters for NOTICE: need 2, got 1"
        );
        assert_eq!(p, params(&["#chan"]));
    }

    #[test]
    fn custom_table() {
        static ONLY_TOPIC: RuleTable = RuleTable::new(&[("TOPIC", Rule::Body)]);
        assert_eq!(ONLY_TOPIC.lookup("TOPIC"), Some(Rule::Body));
        assert_eq!(ONLY_TOPIC.lookup("PRIVMSG"), None);
        assert!(!ONLY_TOPIC.is_empty());
    }
}
