//! Store keys and their case policy

use serde::{Deserialize, Serialize};

/// How a key's letter case is treated before it reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCase {
    /// Lower-case the key, so `Foo` and `foo` address the same entry
    Insensitive,
    /// Send the key exactly as given
    Sensitive,
}

/// A key plus an optional case policy
///
/// Plain strings convert into a `Key` without a policy, which makes the
/// facade apply its configured default. Once case-insensitive access is used
/// for a key anywhere, every access to it should be case-insensitive: the
/// stored entry only exists under the lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    name: String,
    case: Option<KeyCase>,
}

impl Key {
    /// Key that follows the facade default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            case: None,
        }
    }

    /// Key sent verbatim regardless of the facade default
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            case: Some(KeyCase::Sensitive),
        }
    }

    /// Key lower-cased regardless of the facade default
    pub fn folded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            case: Some(KeyCase::Insensitive),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn case(&self) -> Option<KeyCase> {
        self.case
    }

    /// Store-side name under the given default policy
    pub fn resolve(self, ignore_case_by_default: bool) -> String {
        let case = self.case.unwrap_or(if ignore_case_by_default {
            KeyCase::Insensitive
        } else {
            KeyCase::Sensitive
        });
        match case {
            KeyCase::Insensitive => self.name.to_lowercase(),
            KeyCase::Sensitive => self.name,
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::new(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::new(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::new(name.as_str())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_follows_facade() {
        assert_eq!(Key::from("User:1").resolve(true), "user:1");
        assert_eq!(Key::from("User:1").resolve(false), "User:1");
    }

    #[test]
    fn test_explicit_policy_wins() {
        assert_eq!(Key::exact("User:1").resolve(true), "User:1");
        assert_eq!(Key::folded("User:1").resolve(false), "user:1");
    }

    #[test]
    fn test_unicode_lowercase() {
        assert_eq!(Key::from("ÄRGER").resolve(true), "ärger");
    }
}
