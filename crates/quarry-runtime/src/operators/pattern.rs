//! LIKE and REGEXP evaluation

use crate::error::{Result, RuntimeError};
use crate::options::MatcherOptions;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Translate a LIKE pattern into an anchored regex: `%` matches any run of
/// characters, `_` exactly one, and `\` escapes the next character
pub(crate) fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    regex.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

pub(crate) fn like_matches(text: &str, pattern: &str, options: &MatcherOptions) -> Result<bool> {
    let key = PatternKey {
        pattern: pattern.to_string(),
        kind: PatternKind::Like,
        case_insensitive: options.case_insensitive_like,
        size_limit: options.regex_size_limit,
    };
    Ok(global_pattern_cache().get_or_compile(key)?.is_match(text))
}

/// Unanchored search with the raw pattern
pub(crate) fn regexp_matches(text: &str, pattern: &str, options: &MatcherOptions) -> Result<bool> {
    let key = PatternKey {
        pattern: pattern.to_string(),
        kind: PatternKind::Regexp,
        case_insensitive: false,
        size_limit: options.regex_size_limit,
    };
    Ok(global_pattern_cache().get_or_compile(key)?.is_match(text))
}

/// Maximum number of compiled patterns kept; half are evicted when full
const MAX_CACHE_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PatternKind {
    Like,
    Regexp,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternKey {
    pattern: String,
    kind: PatternKind,
    case_insensitive: bool,
    size_limit: usize,
}

impl PatternKey {
    fn compile(&self) -> Result<Regex> {
        let source = match self.kind {
            PatternKind::Like => like_to_regex(&self.pattern),
            PatternKind::Regexp => self.pattern.clone(),
        };
        RegexBuilder::new(&source)
            .case_insensitive(self.case_insensitive)
            .dot_matches_new_line(self.kind == PatternKind::Like)
            .size_limit(self.size_limit)
            .build()
            .map_err(|e| RuntimeError::InvalidPattern {
                pattern: self.pattern.clone(),
                message: e.to_string(),
            })
    }
}

/// Compiled LIKE and REGEXP patterns shared across rows and matchers
struct PatternCache {
    cache: RwLock<HashMap<PatternKey, Regex>>,
}

impl PatternCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Invalid patterns are not cached; every lookup reports the error again
    fn get_or_compile(&self, key: PatternKey) -> Result<Regex> {
        if let Ok(cache) = self.cache.read() {
            if let Some(regex) = cache.get(&key) {
                return Ok(regex.clone());
            }
        }

        let regex = key.compile()?;
        if let Ok(mut cache) = self.cache.write() {
            if cache.len() >= MAX_CACHE_SIZE {
                let keys: Vec<_> = cache.keys().take(MAX_CACHE_SIZE / 2).cloned().collect();
                for key in keys {
                    cache.remove(&key);
                }
            }
            tracing::trace!(pattern = %key.pattern, kind = ?key.kind, "Compiled pattern");
            cache.insert(key, regex.clone());
        }
        Ok(regex)
    }

    #[cfg(test)]
    fn contains(&self, key: &PatternKey) -> bool {
        self.cache.read().map(|c| c.contains_key(key)).unwrap_or(false)
    }
}

static GLOBAL_CACHE: OnceLock<PatternCache> = OnceLock::new();

fn global_pattern_cache() -> &'static PatternCache {
    GLOBAL_CACHE.get_or_init(PatternCache::new)
}
