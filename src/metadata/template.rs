//! Literal placeholder substitution over a run environment.

use std::collections::{BTreeMap, BTreeSet};

/// Request-scoped mapping from placeholder token to value.
///
/// Placeholders are plain literal substrings chosen by the provider author
/// (e.g. `{{series}}`, `$MANGA_ID`); there is no delimiter syntax.
///
/// # Example
///
/// ```
/// use yuzu::metadata::RunEnv;
///
/// let env = RunEnv::new()
///     .with_var("{series}", "One Piece")
///     .with_var("{chapter}", "1");
///
/// assert_eq!(env.substitute("{series} #{chapter}"), "One Piece #1");
/// assert_eq!(env.substitute("{volume}"), "{volume}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunEnv {
    vars: BTreeMap<String, String>,
}

impl RunEnv {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Add a binding.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Bind `key` to `value`, replacing any previous binding.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Get a binding.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Whether `key` is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the environment has no bindings.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bound placeholder tokens, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.vars.keys().map(|k| k.as_str()).collect()
    }

    /// Replace every occurrence of every bound token in `template`.
    ///
    /// Tokens with no binding are left untouched. Bindings are applied in
    /// token order; a token occurring inside another token's value is only
    /// replaced if it sorts later.
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.vars {
            if key.is_empty() {
                continue;
            }
            if result.contains(key.as_str()) {
                result = result.replace(key.as_str(), value);
            }
        }
        result
    }

    /// Declared tokens that have no binding yet still occur in `text`.
    pub fn unresolved<'a>(&self, text: &str, declared: &'a BTreeSet<String>) -> Vec<&'a str> {
        declared
            .iter()
            .filter(|token| !token.is_empty() && !self.contains(token))
            .filter(|token| text.contains(token.as_str()))
            .map(|token| token.as_str())
            .collect()
    }
}
