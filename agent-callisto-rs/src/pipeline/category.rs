//! Notification categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A class of notable output.
///
/// Declaration order is the classification priority: when text matches
/// rules from several categories, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[serde(alias = "critical")]
    Critical,
    #[serde(alias = "completion")]
    Completion,
    #[serde(alias = "approval")]
    Approval,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Category; 3] = [Self::Critical, Self::Completion, Self::Approval];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Completion => "COMPLETION",
            Self::Approval => "APPROVAL",
        }
    }

    /// Lowercase name, used for sample directories and file prefixes.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Completion => "completion",
            Self::Approval => "approval",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" | "ERROR" => Ok(Self::Critical),
            "COMPLETION" | "DONE" => Ok(Self::Completion),
            "APPROVAL" => Ok(Self::Approval),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_declaration_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
        assert_eq!(Category::ALL[0], Category::Critical);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("approval".parse::<Category>(), Ok(Category::Approval));
        assert_eq!(" Critical ".parse::<Category>(), Ok(Category::Critical));
        assert!("warning".parse::<Category>().is_err());
    }

    #[test]
    fn deserializes_upper_and_lower_case_keys() {
        let upper: Category = serde_yml::from_str("COMPLETION").unwrap();
        let lower: Category = serde_yml::from_str("completion").unwrap();
        assert_eq!(upper, Category::Completion);
        assert_eq!(lower, Category::Completion);
    }
}
