//! `Name`: an identifier matching `[A-Za-z0-9_.]+` (spec.md §3).

use std::fmt;
use std::sync::Arc;

use crate::errors::{NameErr, NameResult};

/// Cheaply-clonable identifier. Validated once at construction so every
/// other piece of the checker can treat a `Name` as already well-formed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(s: impl Into<String>) -> NameResult<Name> {
        let s = s.into();
        if s.is_empty() || !s.chars().all(is_name_char) {
            return Err(NameErr::BadName(s));
        }
        Ok(Name(Arc::from(s)))
    }

    /// Construct without validating. Only used internally for names this
    /// module itself manufactures (`"<erased>"`, `"%<n>"`), which are
    /// outside the source-level name grammar on purpose (spec.md §6).
    pub(crate) fn sentinel(s: impl Into<String>) -> Name {
        Name(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_grammar_charset() {
        assert!(Name::new("foo_bar.Baz123").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(Name::new("").is_err());
    }

    #[test]
    fn rejects_reserved_characters() {
        assert!(Name::new("a<b").is_err());
        assert!(Name::new("a>b").is_err());
        assert!(Name::new("a%b").is_err());
    }

    #[test]
    fn sentinel_bypasses_validation() {
        let n = Name::sentinel("%3");
        assert_eq!(n.as_str(), "%3");
    }
}
