//! Claude Code JSONL transcript parser.
//!
//! The hook only gets a transcript path on `Stop`; the assistant's final
//! text is what gets classified.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
struct TranscriptEntry {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    message: Option<TranscriptMessage>,
}

#[derive(Deserialize)]
struct TranscriptMessage {
    content: Option<MessageContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: Option<String>,
    text: Option<String>,
}

/// Last non-empty assistant text, keeping at most its final `max_chars`
/// characters.
pub fn extract_last_assistant_text(transcript_path: &Path, max_chars: usize) -> Option<String> {
    let contents = match fs::read_to_string(transcript_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read transcript {}: {e}", transcript_path.display());
            return None;
        }
    };

    contents
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<TranscriptEntry>(line).ok())
        .filter(|entry| entry.entry_type.as_deref() == Some("assistant"))
        .find_map(|entry| assistant_text(entry.message?.content?))
        .map(|text| tail_chars(&text, max_chars).to_string())
}

/// The last `max_chars` characters; status lines end a message.
fn tail_chars(text: &str, max_chars: usize) -> &str {
    let skip = text.chars().count().saturating_sub(max_chars);
    match text.char_indices().nth(skip) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}

fn assistant_text(content: MessageContent) -> Option<String> {
    let text = match content {
        MessageContent::Text(text) => text,
        MessageContent::Blocks(blocks) => blocks
            .into_iter()
            .filter(|b| b.block_type.as_deref() == Some("text"))
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_transcript(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            std::io::Write::write_all(&mut file, format!("{line}\n").as_bytes()).unwrap();
        }
        file
    }

    #[test]
    fn finds_last_assistant_text() {
        let file = write_transcript(&[
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"first"}]}}"#,
            r#"{"type":"user","message":{"content":"thanks"}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash"},{"type":"text","text":"Build succeeded."}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read"}]}}"#,
        ]);
        assert_eq!(
            extract_last_assistant_text(file.path(), 2000).as_deref(),
            Some("Build succeeded.")
        );
    }

    #[test]
    fn accepts_plain_string_content_and_keeps_the_end() {
        let file = write_transcript(&[r#"{"type":"assistant","message":{"content":"abcdefgh"}}"#]);
        assert_eq!(extract_last_assistant_text(file.path(), 3).as_deref(), Some("fgh"));
        assert_eq!(extract_last_assistant_text(file.path(), 100).as_deref(), Some("abcdefgh"));
    }

    #[test]
    fn long_message_keeps_closing_status() {
        let body = format!("{}All tests passed.", "Here is what I changed in the code. ".repeat(70));
        let line = serde_json::json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": body}]},
        })
        .to_string();
        let file = write_transcript(&[&line]);

        let text = extract_last_assistant_text(file.path(), 2000).unwrap();
        assert_eq!(text.chars().count(), 2000);
        assert!(text.ends_with("All tests passed."));
    }

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail_chars("héllo✓", 2), "o✓");
        assert_eq!(tail_chars("ok", 0), "");
        assert_eq!(tail_chars("ok", 5), "ok");
    }

    #[test]
    fn skips_malformed_lines() {
        let file = write_transcript(&[
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Task completed"}]}}"#,
            "{truncated",
        ]);
        assert_eq!(
            extract_last_assistant_text(file.path(), 100).as_deref(),
            Some("Task completed")
        );
    }

    #[test]
    fn missing_file_yields_none() {
        assert_eq!(
            extract_last_assistant_text(Path::new("/nonexistent/transcript.jsonl"), 100),
            None
        );
    }
}
