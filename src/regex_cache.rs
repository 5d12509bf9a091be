//! Process-wide cache of compiled byte regexes.
//!
//! Dependency substitution builds the same patterns for every file a rule
//! selects. Compiled regexes are shared across file tasks (cloning a
//! [`Regex`] is cheap). The cache is capped at 256 entries; it is cleared
//! when full.

use regex::bytes::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

const MAX_CACHE_ENTRIES: usize = 256;

fn cache() -> &'static Mutex<HashMap<String, Regex>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Get a compiled regex from cache, or compile and cache it.
pub fn get_or_compile(pattern: &str) -> Result<Regex, regex::Error> {
    // A poisoned lock only means another task panicked mid-insert; the map is
    // still usable.
    let mut cache = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    if cache.len() >= MAX_CACHE_ENTRIES {
        cache.clear();
    }

    let compiled = Regex::new(pattern)?;
    cache.insert(pattern.to_string(), compiled.clone());
    Ok(compiled)
}

/// Whether `pattern` is currently compiled in the cache.
pub fn is_cached(pattern: &str) -> bool {
    cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .contains_key(pattern)
}

/// Number of cached patterns.
pub fn size() -> usize {
    cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .len()
}
