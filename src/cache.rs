//! Thread-local compilation cache for ast-grep patterns.
//!
//! Pattern predicates are evaluated at every candidate node of every file,
//! so the same pattern string gets compiled thousands of times per run
//! without a cache. Capped at 256 entries; cleared wholesale when full.

use ast_grep_core::Pattern;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Every model in this crate parses the same language, so the pattern
/// string alone is the key.
pub fn get_or_compile(pattern_str: &str) -> Pattern {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(pattern_str) {
            return p.clone();
        }

        // Evict all if at capacity; batch workloads rebuild cheaply
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Pattern::new(pattern_str, crate::model::rust());
        cache.insert(pattern_str.to_string(), compiled.clone());
        compiled
    })
}

/// Clear the pattern cache (mainly for testing).
pub fn clear() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Number of cached patterns on this thread.
pub fn size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}
