//! Category classification over buffered output.
//!
//! Rules are a data table (category → ordered regex list) checked in
//! category priority order. Every rule is case-insensitive.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::category::Category;

const CRITICAL_RULES: &[&str] = &["error", "failed", "failure", "fatal"];

const COMPLETION_RULES: &[&str] = &[
    "completed",
    "succeeded",
    "successful",
    r"tests? passed",
    "build succeeded",
    "deployment complete",
    "code review completed",
    "review completed",
    "task completed",
    "merge completed",
    "successfully merged",
];

const APPROVAL_RULES: &[&str] = &[
    "approval required",
    "approval requested",
    "ready for review",
    "waiting for approval",
];

/// Built-in rule source for a category.
pub fn default_rules(category: Category) -> &'static [&'static str] {
    match category {
        Category::Critical => CRITICAL_RULES,
        Category::Completion => COMPLETION_RULES,
        Category::Approval => APPROVAL_RULES,
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Immutable category → rule table.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    table: Vec<(Category, Vec<Regex>)>,
}

impl CategoryMatcher {
    /// Build with the built-in rules only.
    pub fn new() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    /// Build with per-category overrides.
    ///
    /// An override replaces the whole rule list of its category. Rules that
    /// fail to compile are skipped; a category left with no valid override
    /// rule keeps its built-in rules.
    pub fn with_overrides(overrides: &HashMap<Category, Vec<String>>) -> Self {
        let table = Category::ALL
            .iter()
            .map(|&category| {
                let rules = overrides
                    .get(&category)
                    .map(|patterns| compile_overrides(category, patterns))
                    .filter(|rules| !rules.is_empty())
                    .unwrap_or_else(|| compile_defaults(category));
                (category, rules)
            })
            .collect();

        Self { table }
    }

    /// First category (in priority order) with a rule matching `text`.
    pub fn classify(&self, text: &str) -> Option<Category> {
        self.table
            .iter()
            .find(|(_, rules)| rules.iter().any(|rule| rule.is_match(text)))
            .map(|(category, _)| *category)
    }

    /// Rules in effect for `category`.
    pub fn rules(&self, category: Category) -> &[Regex] {
        self.table
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_defaults(category: Category) -> Vec<Regex> {
    default_rules(category)
        .iter()
        .filter_map(|pattern| compile(pattern).ok())
        .collect()
}

fn compile_overrides(category: Category, patterns: &[String]) -> Vec<Regex> {
    let rules: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| match compile(pattern) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Ignoring invalid {category} pattern {pattern:?}: {e}");
                None
            }
        })
        .collect();

    if rules.is_empty() {
        warn!("No usable {category} override patterns, keeping defaults");
    } else {
        debug!("{category}: {} override patterns", rules.len());
    }
    rules
}
