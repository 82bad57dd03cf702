//! Short spoken phrases for matched output.
//!
//! Each category has an ordered rule table; the first rule whose pattern
//! matches the cleaned text renders the phrase, otherwise the category
//! fallback is used.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::category::Category;

const CRITICAL_FALLBACK: &str = "Error occurred";
const COMPLETION_FALLBACK: &str = "Operation completed";
const APPROVAL_FALLBACK: &str = "Action needed";

const MAX_ERROR_FRAGMENT: usize = 50;
const MAX_PLAIN_SUMMARY: usize = 100;

static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    // OSC (terminated by BEL or ST), CSI, then any other two-byte escape
    Regex::new(r"\x1b(?:\][^\x07\x1b]*(?:\x07|\x1b\\)?|\[[0-?]*[ -/]*[@-~]|[@-_])")
        .expect("static pattern")
});

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("static pattern")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));

static ERROR_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:errors?|failure|failed|fatal)").expect("static pattern")
});

struct SummaryRule {
    pattern: Regex,
    render: fn(&Captures<'_>) -> String,
}

impl SummaryRule {
    fn new(pattern: &str, render: fn(&Captures<'_>) -> String) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){pattern}")).expect("static pattern"),
            render,
        }
    }
}

static COMPLETION_RULES: LazyLock<Vec<SummaryRule>> = LazyLock::new(|| {
    vec![
        SummaryRule::new(r"build (?:succeeded|successful)", |_| "Build succeeded".into()),
        SummaryRule::new(r"\b(?P<count>\d+)\s+tests?\s+passed", |caps| {
            match &caps["count"] {
                "1" => "1 test passed".into(),
                n => format!("{n} tests passed"),
            }
        }),
        SummaryRule::new(r"tests?\s+passed", |_| "Tests passed".into()),
        SummaryRule::new(r"deployment (?:complete|successful)", |_| {
            "Deployment complete".into()
        }),
        SummaryRule::new(r"code review completed", |_| "Code review completed".into()),
        SummaryRule::new(r"review completed", |_| "Review completed".into()),
        SummaryRule::new(r"task completed", |_| "Task completed".into()),
        SummaryRule::new(r"merge completed|successfully merged", |_| {
            "Merge completed".into()
        }),
    ]
});

static APPROVAL_RULES: LazyLock<Vec<SummaryRule>> = LazyLock::new(|| {
    vec![
        SummaryRule::new(r"ready for review", |_| "Ready for review".into()),
        SummaryRule::new(r"approval (?:required|requested)", |_| "Approval required".into()),
    ]
});

/// Summarize `text` for announcement under `category`.
///
/// With no category, returns the first sentence of the cleaned text.
pub fn extract(text: &str, category: Option<Category>) -> String {
    let cleaned = clean(text);
    match category {
        Some(Category::Critical) => critical_summary(&cleaned),
        Some(Category::Completion) => {
            first_rule(&COMPLETION_RULES, &cleaned).unwrap_or_else(|| COMPLETION_FALLBACK.into())
        }
        Some(Category::Approval) => {
            first_rule(&APPROVAL_RULES, &cleaned).unwrap_or_else(|| APPROVAL_FALLBACK.into())
        }
        None => truncate_chars(first_sentence(&cleaned), MAX_PLAIN_SUMMARY)
            .trim_end()
            .to_string(),
    }
}

/// Strip escape sequences and control characters, collapse whitespace.
pub fn clean(text: &str) -> String {
    let text = ESCAPE_SEQUENCE.replace_all(text, "");
    let text = CONTROL_CHARS.replace_all(&text, "");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

fn first_rule(rules: &[SummaryRule], text: &str) -> Option<String> {
    rules
        .iter()
        .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule.render)(&caps)))
}

fn critical_summary(text: &str) -> String {
    let Some(keyword) = ERROR_KEYWORD.find(text) else {
        return CRITICAL_FALLBACK.into();
    };

    let rest = text[keyword.end()..]
        .trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
    let sentence = first_sentence(rest).trim_end_matches(['.', '!', '?']);
    let fragment = truncate_chars(sentence, MAX_ERROR_FRAGMENT).trim();

    if fragment.is_empty() {
        CRITICAL_FALLBACK.into()
    } else {
        format!("Error: {fragment}")
    }
}

/// Text up to and including the first `.`, `!` or `?` that ends a sentence.
fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                None => return text,
                Some((_, next)) if next.is_whitespace() => return &text[..i + c.len_utf8()],
                Some(_) => {}
            }
        }
    }
    text
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_succeeded_beats_test_count() {
        let summary = extract("Build succeeded with 247 tests passed", Some(Category::Completion));
        assert_eq!(summary, "Build succeeded");
    }

    #[test]
    fn captures_test_count() {
        let summary = extract("All 42 tests passed successfully!", Some(Category::Completion));
        assert_eq!(summary, "42 tests passed");
        let summary = extract("1 test passed", Some(Category::Completion));
        assert_eq!(summary, "1 test passed");
        let summary = extract("tests passed", Some(Category::Completion));
        assert_eq!(summary, "Tests passed");
    }

    #[test]
    fn completion_phrases() {
        let cases = [
            ("Code review completed successfully", "Code review completed"),
            ("Deployment complete to production", "Deployment complete"),
            ("Task completed successfully", "Task completed"),
            ("Successfully merged pull request #42", "Merge completed"),
            ("review completed by bot", "Review completed"),
            ("Job succeeded", "Operation completed"),
        ];
        for (text, expected) in cases {
            assert_eq!(extract(text, Some(Category::Completion)), expected, "{text}");
        }
    }

    #[test]
    fn error_fragment_follows_keyword() {
        let summary = extract(
            "Error: Cannot find module \"missing-package\"",
            Some(Category::Critical),
        );
        assert_eq!(summary, "Error: Cannot find module \"missing-package\"");
    }

    #[test]
    fn error_fragment_stops_at_sentence_boundary() {
        let summary = extract(
            "npm ERR! fatal: repository not found. Check the URL.",
            Some(Category::Critical),
        );
        assert_eq!(summary, "Error: repository not found");
    }

    #[test]
    fn error_fragment_keeps_dotted_names() {
        let summary = extract("error: cannot open config.yaml", Some(Category::Critical));
        assert_eq!(summary, "Error: cannot open config.yaml");
    }

    #[test]
    fn error_fragment_is_truncated() {
        let long = format!("error: {}", "x".repeat(200));
        let summary = extract(&long, Some(Category::Critical));
        let fragment = summary.strip_prefix("Error: ").unwrap();
        assert_eq!(fragment.chars().count(), MAX_ERROR_FRAGMENT);
    }

    #[test]
    fn error_without_fragment_falls_back() {
        assert_eq!(extract("Build failed", Some(Category::Critical)), CRITICAL_FALLBACK);
        assert_eq!(extract("nothing here", Some(Category::Critical)), CRITICAL_FALLBACK);
    }

    #[test]
    fn approval_phrases() {
        assert_eq!(
            extract("Ready for review - please approve", Some(Category::Approval)),
            "Ready for review"
        );
        assert_eq!(
            extract("Approval required for merge", Some(Category::Approval)),
            "Approval required"
        );
        assert_eq!(
            extract("approval requested by CI", Some(Category::Approval)),
            "Approval required"
        );
        assert_eq!(
            extract("Waiting for approval", Some(Category::Approval)),
            APPROVAL_FALLBACK
        );
    }

    #[test]
    fn uncategorized_uses_first_sentence() {
        assert_eq!(extract("Hello there. General Kenobi.", None), "Hello there.");
        let long = "a".repeat(300);
        assert_eq!(extract(&long, None).chars().count(), MAX_PLAIN_SUMMARY);
    }

    #[test]
    fn clean_strips_escapes_and_collapses_newlines() {
        let raw = "\x1b[1;31mError\x1b[0m:\r\n  disk\tfull\x07\x1b]0;title\x07 now";
        assert_eq!(clean(raw), "Error: disk full now");
    }

    #[test]
    fn escapes_never_reach_summary() {
        let raw = "\x1b[31merror:\x1b[0m \x1b[1mlink failed\x1b[0m";
        let summary = extract(raw, Some(Category::Critical));
        assert!(!summary.contains('\x1b'));
        assert_eq!(summary, "Error: link failed");
    }

    #[test]
    fn summaries_are_order_sensitive_within_category() {
        // "code review completed" must win over the broader "review completed".
        let summary = extract("review completed; code review completed", Some(Category::Completion));
        assert_eq!(summary, "Code review completed");
    }
}
