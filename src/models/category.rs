use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::{CoreError, CoreResult};

pub(crate) const MAX_CATEGORY_LEN: usize = 64;

/// Label used when a stored row carries an unusable category.
pub(crate) const UNCATEGORIZED: &str = "Uncategorized";

/// A spending category from an open set of labels.
///
/// Whitespace is normalised on construction and comparisons ignore case, so
/// "food  & dining" and "Food & Dining" name the same budget.
#[derive(Debug, Clone)]
pub(crate) struct Category {
    name: String,
    key: String,
}

impl Category {
    pub(crate) fn new(raw: &str) -> CoreResult<Self> {
        let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(CoreError::validation("category must not be empty"));
        }
        if name.chars().count() > MAX_CATEGORY_LEN {
            return Err(CoreError::validation(format!(
                "category '{name}' is longer than {MAX_CATEGORY_LEN} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(CoreError::validation(
                "category must not contain control characters",
            ));
        }
        let key = name.to_lowercase();
        Ok(Self { name, key })
    }

    pub(crate) fn uncategorized() -> Self {
        Self {
            name: UNCATEGORIZED.to_string(),
            key: UNCATEGORIZED.to_lowercase(),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
