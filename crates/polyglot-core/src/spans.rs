//! Span-preserving tokenization of chat markup.
//!
//! Translation providers happily mangle code fences, mentions and URLs, so
//! before a message is sent out every structural substring is replaced by a
//! placeholder token (`⟦SP0⟧`, `⟦SP1⟧`, ...) and restored verbatim afterwards.
//! The bracket glyphs are reserved; they never occur in ordinary chat text,
//! so a placeholder cannot collide with translatable content.
//!
//! Patterns are applied in a fixed priority order and a match is only
//! accepted if it does not intersect an already-accepted range.  A URL inside
//! a fenced code block is therefore never captured on its own: the code-block
//! match already claimed those bytes.

use regex::Regex;

use crate::error::SpanError;

/// Classification of a protected substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    CodeBlock,
    InlineCode,
    Spoiler,
    BlockQuote,
    Mention,
    Link,
    CustomEmoji,
    Timestamp,
}

/// A located, protected substring of one message.
///
/// Lives only for the duration of that message's translation: created by
/// [`SpanExtractor::extract`], consumed by [`restore`], then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Byte offset of the first matched byte in the raw message.
    pub start: usize,
    /// Byte offset one past the last matched byte.
    pub end: usize,
    /// The token standing in for this span in the masked text.
    pub placeholder: String,
    /// Original bytes, restored verbatim after translation.
    pub original: String,
}

fn placeholder_for(index: usize) -> String {
    format!("\u{27E6}SP{index}\u{27E7}")
}

/// Compiled structural patterns, in priority order.
pub struct SpanExtractor {
    patterns: Vec<(Regex, SpanKind)>,
}

impl SpanExtractor {
    pub fn new() -> Self {
        // Earlier patterns win overlapping regions.
        let table: [(&str, SpanKind); 9] = [
            (r"```[\s\S]*?```", SpanKind::CodeBlock),
            (r"(?s)\|\|.*?\|\|", SpanKind::Spoiler),
            (r"(?m)^>[^\n]*", SpanKind::BlockQuote),
            (r"`[^`\n]+`", SpanKind::InlineCode),
            (r"\[[^\]]+\]\([^)\s]+\)", SpanKind::Link),
            (r"(?i)https?://\S+", SpanKind::Link),
            (r"<(@[!&]?|#)\d+>", SpanKind::Mention),
            (r"<a?:[\w~]+:\d+>", SpanKind::CustomEmoji),
            (r"<t:\d+(?::[tTdDfFR])?>", SpanKind::Timestamp),
        ];

        let patterns = table
            .into_iter()
            .map(|(pattern, kind)| {
                // Static, known-valid patterns.
                (Regex::new(pattern).expect("structural pattern compiles"), kind)
            })
            .collect();

        Self { patterns }
    }

    /// Mask every structural substring of `raw` with a placeholder.
    ///
    /// Returns the masked text plus the spans in registration order (which is
    /// also placeholder-index order).  All non-matched bytes are preserved
    /// verbatim, in order.
    pub fn extract(&self, raw: &str) -> (String, Vec<Span>) {
        let mut spans: Vec<Span> = Vec::new();
        let mut taken: Vec<(usize, usize)> = Vec::new();

        for (pattern, kind) in &self.patterns {
            for m in pattern.find_iter(raw) {
                let (start, end) = (m.start(), m.end());
                if start == end {
                    continue;
                }
                if taken.iter().any(|&(s, e)| start < e && end > s) {
                    continue;
                }
                let placeholder = placeholder_for(spans.len());
                spans.push(Span {
                    kind: *kind,
                    start,
                    end,
                    placeholder,
                    original: raw[start..end].to_string(),
                });
                taken.push((start, end));
            }
        }

        let mut ordered: Vec<&Span> = spans.iter().collect();
        ordered.sort_by_key(|span| span.start);

        let mut masked = String::with_capacity(raw.len());
        let mut cursor = 0;
        for span in ordered {
            masked.push_str(&raw[cursor..span.start]);
            masked.push_str(&span.placeholder);
            cursor = span.end;
        }
        masked.push_str(&raw[cursor..]);

        (masked, spans)
    }
}

impl Default for SpanExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute every placeholder in `translated` back with its original text.
///
/// Fails with [`SpanError::MissingPlaceholder`] if any placeholder is absent:
/// the provider dropped or rewrote it, and dispatching the result would
/// silently corrupt the message.
pub fn restore(translated: &str, spans: &[Span]) -> Result<String, SpanError> {
    let mut result = translated.to_string();
    for span in spans {
        if !result.contains(&span.placeholder) {
            return Err(SpanError::MissingPlaceholder(span.placeholder.clone()));
        }
        result = result.replace(&span.placeholder, &span.original);
    }
    Ok(result)
}
