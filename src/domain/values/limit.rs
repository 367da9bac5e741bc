use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 100;

/// Number of hits a search may return, bounded to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimit(usize);

impl SearchLimit {
    pub fn new(value: usize) -> Result<Self, String> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&value) {
            return Err(format!(
                "Limit must be between {MIN_LIMIT} and {MAX_LIMIT}, got {value}"
            ));
        }
        Ok(SearchLimit(value))
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for SearchLimit {
    fn default() -> Self {
        SearchLimit(5)
    }
}
