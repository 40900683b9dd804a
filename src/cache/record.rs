use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Independent layers of the result cache, ordered cheapest to most expensive to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Pages,
    Content,
    Frequency,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Pages, Namespace::Content, Namespace::Frequency];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Pages => "pages",
            Namespace::Content => "content",
            Namespace::Frequency => "frequency",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached payload and the moment it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

impl<T> CacheRecord<T> {
    pub fn new(payload: T) -> Self {
        Self {
            created_at: Utc::now(),
            payload,
        }
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_display_matches_directory_name() {
        for namespace in Namespace::ALL {
            assert_eq!(namespace.to_string(), namespace.as_str());
        }
        assert_eq!(Namespace::Content.to_string(), "content");
    }
}
