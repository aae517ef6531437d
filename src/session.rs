//! Reusable comparison state.
//!
//! A [`CompareSession`] owns the string pool that backs report string ids.
//! Reusing one session across comparisons of related documents keeps
//! repeated text (authors, dates, recurring phrases) interned once.

use crate::string_pool::StringPool;

#[derive(Debug, Default)]
pub struct CompareSession {
    pub strings: StringPool,
}

impl CompareSession {
    pub fn new() -> CompareSession {
        CompareSession {
            strings: StringPool::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_holds_only_the_empty_string() {
        let session = CompareSession::new();
        assert_eq!(session.strings.len(), 1);
    }
}
