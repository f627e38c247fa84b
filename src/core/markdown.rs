// src/core/markdown.rs — Fenced code block extraction from model replies

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

/// Contents of the first fenced code block in `text`, if any.
///
/// Indented code blocks are ignored. An unterminated fence runs to the end
/// of the text, matching CommonMark.
pub fn extract_fenced_block(text: &str) -> Option<String> {
    let mut inside = false;
    let mut body = String::new();

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                inside = true;
            }
            Event::Text(chunk) if inside => body.push_str(&chunk),
            Event::End(TagEnd::CodeBlock) if inside => {
                return Some(body.trim_end().to_string());
            }
            _ => {}
        }
    }

    inside.then(|| body.trim_end().to_string())
}

/// First fenced block if present, otherwise the whole reply trimmed.
pub fn strip_fences(text: &str) -> String {
    extract_fenced_block(text).unwrap_or_else(|| text.trim().to_string())
}
