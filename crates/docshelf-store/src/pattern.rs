//! `LIKE` and `GLOB` matching with SQLite's semantics.
//!
//! The in-memory store uses these so both engines agree on pattern filters.
//! Each pattern is translated into an anchored regex and compiled once.
//!
//! `LIKE`: `%` matches any run, `_` one character, ASCII letters compare
//! case-insensitively, no escape character. `GLOB`: `*` any run, `?` one
//! character, `[...]` a character class (`^` negates, `a-z` ranges, a `]`
//! right after the opening bracket is literal), case-sensitive. An unclosed
//! class never matches.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dialect {
    Like,
    Glob,
}

/// Compiled patterns kept before the cache is flushed.
const CACHE_LIMIT: usize = 256;

type PatternCache = Mutex<HashMap<(Dialect, String), Option<Regex>>>;

fn cache() -> &'static PatternCache {
    static CACHE: OnceLock<PatternCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Match `text` against a SQL `LIKE` pattern.
pub fn like_match(pattern: &str, text: &str) -> bool {
    compiled(Dialect::Like, pattern).is_some_and(|regex| regex.is_match(text))
}

/// Match `text` against a shell-style `GLOB` pattern.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    compiled(Dialect::Glob, pattern).is_some_and(|regex| regex.is_match(text))
}

/// The regex for `pattern`, or `None` if it can never match.
fn compiled(dialect: Dialect, pattern: &str) -> Option<Regex> {
    let key = (dialect, pattern.to_string());
    if let Ok(cache) = cache().lock() {
        if let Some(found) = cache.get(&key) {
            return found.clone();
        }
    }

    let source = match dialect {
        Dialect::Like => Some(like_source(pattern)),
        Dialect::Glob => glob_source(pattern),
    };
    let regex = source.and_then(|source| match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "could not compile pattern; it matches nothing");
            None
        }
    });

    if let Ok(mut cache) = cache().lock() {
        if cache.len() >= CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(key, regex.clone());
    }
    regex
}

fn anchored(body: &str) -> String {
    format!(r"\A(?s:{})\z", body)
}

fn literal(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

/// A class member as a `\x{..}` escape, valid anywhere inside `[...]`.
fn class_char(c: char) -> String {
    format!(r"\x{{{:X}}}", u32::from(c))
}

fn like_source(pattern: &str) -> String {
    let mut body = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '%' => body.push_str(".*"),
            '_' => body.push('.'),
            c if c.is_ascii_alphabetic() => {
                body.push('[');
                body.push(c.to_ascii_lowercase());
                body.push(c.to_ascii_uppercase());
                body.push(']');
            }
            c => body.push_str(&literal(c)),
        }
    }
    anchored(&body)
}

fn glob_source(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut body = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            '[' => {
                i += 1;
                let negated = chars.get(i) == Some(&'^');
                if negated {
                    i += 1;
                }

                let mut members = String::new();
                if chars.get(i) == Some(&']') {
                    // A leading `]` is literal and never starts a range.
                    members.push_str(&class_char(']'));
                    i += 1;
                }
                loop {
                    let c = *chars.get(i)?;
                    if c == ']' {
                        break;
                    }

                    let end = chars
                        .get(i + 2)
                        .copied()
                        .filter(|&end| chars.get(i + 1) == Some(&'-') && end != ']');
                    match end {
                        Some(end) if c <= end => {
                            members.push_str(&format!("{}-{}", class_char(c), class_char(end)));
                            i += 3;
                        }
                        // A reversed range only matches its first character.
                        Some(_) => {
                            members.push_str(&class_char(c));
                            i += 3;
                        }
                        None => {
                            members.push_str(&class_char(c));
                            i += 1;
                        }
                    }
                }

                body.push('[');
                if negated {
                    body.push('^');
                }
                body.push_str(&members);
                body.push(']');
            }
            c => body.push_str(&literal(c)),
        }
        i += 1;
    }

    Some(anchored(&body))
}
