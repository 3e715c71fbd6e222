//! Binary media type policy.
//!
//! # Design Decisions
//! - Exact content-type match first, as configured
//! - Then the essence (`type/subtype`, parameters dropped, case-insensitive)
//! - `type/*` and `*/*` entries act as wildcards
//! - An empty set never marks anything as binary

use std::collections::HashSet;

/// The set of response content types returned base64 encoded.
#[derive(Debug, Clone, Default)]
pub struct BinaryMediaTypes {
    exact: HashSet<String>,
    essences: HashSet<String>,
}

impl BinaryMediaTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for t in types {
            let t = t.into();
            set.essences.insert(essence(&t));
            set.exact.insert(t);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Returns true if a body with this content type must be base64 encoded.
    pub fn contains(&self, content_type: &str) -> bool {
        if self.exact.is_empty() {
            return false;
        }
        if self.exact.contains(content_type) {
            return true;
        }

        let essence = essence(content_type);
        if self.essences.contains(&essence) || self.essences.contains("*/*") {
            return true;
        }

        match essence.split_once('/') {
            Some((top, _)) => self.essences.contains(&format!("{}/*", top)),
            None => false,
        }
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
