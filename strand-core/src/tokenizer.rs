//! Token Counting
//!
//! Exact counting via the GPT-4-compatible cl100k BPE. The encoder is built
//! once and shared; construction cost is paid on first use.

use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, CoreBPE};

fn bpe() -> &'static CoreBPE {
    static BPE: OnceLock<CoreBPE> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().expect("cl100k_base encoder is bundled"))
}

/// Count tokens in `text`. Empty input counts as zero.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    bpe().encode_with_special_tokens(text).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn nonempty_is_positive() {
        assert!(count_tokens("hello world") > 0);
    }

    #[test]
    fn longer_text_counts_more() {
        let short = count_tokens("one sentence.");
        let long = count_tokens("one sentence. and then another, considerably longer one.");
        assert!(long > short);
    }
}
