//! Context Compression
//!
//! Bounds conversation growth by LLM-driven summarization: when the token
//! estimate (or the provider-reported total) crosses the limit, the oldest
//! rounds collapse into one synthetic user-visible summary message. The
//! newest rounds are always retained, and a failed compression is an
//! optimization miss, not an error.

use tracing::{debug, info, warn};

use crate::provider::LlmProvider;
use crate::tokenizer::count_tokens;
use crate::types::{Message, MessageContent, Role};

/// The newest rounds summarization never touches.
pub const RETAINED_ROUNDS: usize = 3;

/// Stable textual marker identifying the synthetic summary message.
pub const SUMMARY_PREFIX: &str = "[Context Summary]";

const SUMMARY_PREAMBLE: &str =
    "The following is a summary of our previous conversation, not a new user request.";

/// Tool result payloads are clipped to this many characters in the
/// compression input.
const TOOL_RESULT_LIMIT: usize = 500;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a conversation summarizer. Condense the \
conversation provided by the user into a concise English summary of at most 2000 words. \
Preserve task-critical facts, decisions, constraints, open questions, and tool outcomes. \
If a previous context summary is included, integrate it so the new summary stands alone.";

// ---------------------------------------------------------------------------
// Token estimation
// ---------------------------------------------------------------------------

/// Estimate the token cost of a message list: content plus thinking plus
/// tool calls, with 4 tokens of per-message framing overhead.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|msg| {
            let content = match &msg.content {
                MessageContent::Text(t) => count_tokens(t),
                MessageContent::Blocks(blocks) => {
                    count_tokens(&serde_json::to_string(blocks).unwrap_or_default())
                }
            };
            let thinking = msg
                .thinking
                .as_deref()
                .map(count_tokens)
                .unwrap_or(0);
            let calls = msg
                .tool_calls
                .as_ref()
                .map(|calls| {
                    count_tokens(&serde_json::to_string(calls).unwrap_or_default())
                })
                .unwrap_or(0);
            content + thinking + calls + 4
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Round partitioning
// ---------------------------------------------------------------------------

/// Whether `msg` is the synthetic summary message.
pub fn is_summary_message(msg: &Message) -> bool {
    msg.role == Role::User && msg.text().starts_with(SUMMARY_PREFIX)
}

/// Indices of round starts: every user-role message from index 1 onward
/// opens a round running to (but excluding) the next user-role message.
fn round_starts(messages: &[Message]) -> Vec<usize> {
    messages
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, m)| m.role == Role::User)
        .map(|(i, _)| i)
        .collect()
}

fn summary_body(content: &str) -> &str {
    let rest = content.strip_prefix(SUMMARY_PREFIX).unwrap_or(content);
    let rest = rest.trim_start();
    rest.strip_prefix(SUMMARY_PREAMBLE).unwrap_or(rest).trim_start()
}

// ---------------------------------------------------------------------------
// Compression input
// ---------------------------------------------------------------------------

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(limit).collect();
        format!("{clipped}…")
    }
}

/// Render the gathered messages as the plain-text summarization request.
/// Reasoning text never enters the input; it must not outlive its turn.
fn build_compression_input(existing_summary: Option<&str>, messages: &[Message]) -> String {
    let mut sections = Vec::new();

    if let Some(previous) = existing_summary.filter(|s| !s.trim().is_empty()) {
        sections.push(format!("Previous Context Summary:\n{previous}"));
    }

    for msg in messages {
        match msg.role {
            Role::User => sections.push(format!("User: {}", msg.text())),
            Role::Assistant => {
                let mut section = format!("Assistant: {}", msg.text());
                if let Some(calls) = msg.tool_calls.as_ref().filter(|c| !c.is_empty()) {
                    let names: Vec<&str> =
                        calls.iter().map(|c| c.function.name.as_str()).collect();
                    section.push_str(&format!("\nTools called: {}", names.join(", ")));
                }
                sections.push(section);
            }
            Role::Tool => {
                let name = msg.name.as_deref().unwrap_or("tool");
                sections.push(format!(
                    "Tool result ({name}): {}",
                    truncate_chars(msg.text(), TOOL_RESULT_LIMIT)
                ));
            }
            Role::System => {}
        }
    }

    sections.join("\n\n")
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// Inspect the conversation and compress the oldest rounds if it has
/// outgrown `token_limit`.
///
/// Returns `Some((before_tokens, after_tokens))` when a compression ran;
/// the message list is rewritten in place as
/// `[system, summary, retained rounds...]`. Failures are swallowed: the list
/// is left untouched and the debounce flag is set so the next inspection
/// skips straight to the provider call instead of retrying hot.
pub async fn maybe_summarize(
    provider: &dyn LlmProvider,
    messages: &mut Vec<Message>,
    token_limit: usize,
    api_total_tokens: u64,
    skip_next_token_check: &mut bool,
) -> Option<(usize, usize)> {
    if *skip_next_token_check {
        *skip_next_token_check = false;
        return None;
    }

    let before = estimate_tokens(messages);
    if before <= token_limit && api_total_tokens <= token_limit as u64 {
        return None;
    }

    let starts = round_starts(messages);
    if starts.len() <= RETAINED_ROUNDS {
        debug!(
            rounds = starts.len(),
            "over token limit but not enough rounds to compress"
        );
        return None;
    }

    let keep_from = starts[starts.len() - RETAINED_ROUNDS];

    let mut existing_summary = None;
    let mut gathered = Vec::new();
    for msg in &messages[1..keep_from] {
        if is_summary_message(msg) {
            existing_summary = Some(summary_body(msg.text()).to_string());
        } else {
            gathered.push(msg.clone());
        }
    }

    let input = build_compression_input(existing_summary.as_deref(), &gathered);
    let request = vec![
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(input),
    ];

    let summary_text = match provider.generate(&request, &[]).await {
        Ok(response) => response.content.unwrap_or_default(),
        Err(err) => {
            warn!(err = %err, "context summarization failed, keeping messages");
            *skip_next_token_check = true;
            return None;
        }
    };
    if summary_text.trim().is_empty() {
        warn!("context summarization returned empty text, keeping messages");
        *skip_next_token_check = true;
        return None;
    }

    let summary_message = Message::user(format!(
        "{SUMMARY_PREFIX}\n\n{SUMMARY_PREAMBLE}\n\n{}",
        summary_text.trim()
    ));

    let mut rebuilt = Vec::with_capacity(2 + messages.len() - keep_from);
    rebuilt.push(messages[0].clone());
    rebuilt.push(summary_message);
    rebuilt.extend_from_slice(&messages[keep_from..]);
    *messages = rebuilt;

    let after = estimate_tokens(messages);
    *skip_next_token_check = true;
    info!(before, after, "compressed conversation context");
    Some((before, after))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
