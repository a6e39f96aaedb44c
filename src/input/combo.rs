//! Trigger specifications such as `ctrl+q`

use super::Token;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A set of tokens that must all be held at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combo {
    tokens: BTreeSet<Token>,
}

impl Combo {
    /// Parse a `+`-separated trigger spec. Empty segments are skipped, so an
    /// empty or all-separator spec yields an empty combo.
    pub fn parse(spec: &str) -> Self {
        let tokens = spec.split('+').filter_map(Token::from_name).collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.tokens.contains(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// True when every token of a non-empty combo is in `held`
    pub fn is_satisfied_by(&self, held: &HashSet<Token>) -> bool {
        !self.tokens.is_empty() && self.tokens.iter().all(|token| held.contains(token))
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(token.as_str())?;
        }
        Ok(())
    }
}
