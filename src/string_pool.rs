use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Index into a [`StringPool`] (and into a report's `strings` table).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringId(pub u32);

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interns strings so revision records can carry cheap copyable ids instead of
/// owned text. Id 0 is always the empty string.
#[derive(Debug)]
pub struct StringPool {
    strings: Vec<String>,
    index: FxHashMap<u64, Vec<StringId>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = StringPool {
            strings: Vec::new(),
            index: FxHashMap::default(),
        };
        pool.intern("");
        pool
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        let h = hash_str(s);
        let bucket = self.index.entry(h).or_default();
        for &id in bucket.iter() {
            if self.strings[id.0 as usize] == s {
                return id;
            }
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_owned());
        bucket.push(id);
        id
    }

    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = FxHasher::default();
    s.hash(&mut hasher);
    hasher.finish()
}
