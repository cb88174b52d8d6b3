//! Re-paces a complete reply into an incremental chunk stream.
//!
//! The generation call returns the whole reply at once; this producer hands
//! it out word by word with short pauses, longer at sentence ends. Consumers
//! only see a `Stream<Item = StreamChunk>`, so a provider that streams
//! natively can feed the same consumer.

use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::sleep;

use crate::models::conversation::StreamChunk;
use crate::models::settings::PacingConfig;

fn sentence_boundary() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").ok()).as_ref()
}

/// Splits after `.`, `!` or `?` followed by whitespace. The punctuation stays
/// with its sentence; the whitespace is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let Some(boundary) = sentence_boundary() else {
        return if text.is_empty() { Vec::new() } else { vec![text] };
    };
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in boundary.find_iter(text) {
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// The chunk sequence with the pause that follows each chunk. Sentences are
/// rejoined with a single space carrying the sentence pause.
pub fn plan_chunks(text: &str, pacing: PacingConfig) -> Vec<(String, Duration)> {
    let word_delay = Duration::from_millis(pacing.word_delay_ms);
    let sentence_delay = Duration::from_millis(pacing.sentence_delay_ms);

    let sentences = split_sentences(text);
    let mut plan = Vec::new();
    for (n, sentence) in sentences.iter().enumerate() {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            let chunk = if i + 1 < words.len() {
                format!("{} ", word)
            } else {
                word.to_string()
            };
            plan.push((chunk, word_delay));
        }
        // gap only between sentences, never after the last one
        if n + 1 < sentences.len() && sentence.ends_with(['.', '!', '?']) {
            plan.push((" ".to_string(), sentence_delay));
        }
    }
    plan
}

/// Stream of paced content chunks. Each pause runs after its chunk has been
/// handed out, and the trailing pause after the last chunk is skipped.
pub fn paced(text: &str, pacing: PacingConfig) -> BoxStream<'static, StreamChunk> {
    let plan = plan_chunks(text, pacing).into_iter();
    stream::unfold((plan, Duration::ZERO), |(mut plan, pending)| async move {
        let (chunk, delay) = plan.next()?;
        if !pending.is_zero() {
            sleep(pending).await;
        }
        Some((StreamChunk::Content(chunk), (plan, delay)))
    })
    .boxed()
}

/// Single-chunk stream carrying an in-band error message.
pub fn error_stream(message: String) -> BoxStream<'static, StreamChunk> {
    stream::once(async move { StreamChunk::Error(message) }).boxed()
}
