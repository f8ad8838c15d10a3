//! Key enumeration patterns

/// Parsed `keys()` pattern
///
/// Only `*`, `prefix*` and exact keys are understood. Anything else (a `*`
/// that is not the last character, `?`, character classes) parses to
/// [`KeyPattern::Unsupported`] and matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    All,
    Prefix(String),
    Exact(String),
    Unsupported,
}

impl KeyPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return KeyPattern::All;
        }

        match pattern.strip_suffix('*') {
            Some(prefix) if !has_glob_chars(prefix) => KeyPattern::Prefix(prefix.to_string()),
            Some(_) => KeyPattern::Unsupported,
            None if has_glob_chars(pattern) => KeyPattern::Unsupported,
            None => KeyPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::All => true,
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
            KeyPattern::Exact(exact) => key == exact,
            KeyPattern::Unsupported => false,
        }
    }
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}
