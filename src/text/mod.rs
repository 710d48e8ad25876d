pub mod sentence;

pub use sentence::{RuleSentenceTokenizer, SentenceTokenizer};

/// Normalize a sentence for exact comparison: lowercase, collapse whitespace
/// runs to a single space, trim ends. Idempotent.
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut space_pending = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !normalized.is_empty() {
                space_pending = true;
            }
        } else {
            if space_pending {
                normalized.push(' ');
                space_pending = false;
            }
            for lower in ch.to_lowercase() {
                normalized.push(lower);
            }
        }
    }

    normalized
}

/// Split a text into sentences and normalize each one, dropping segments that
/// are empty after trimming. Pure function of its input; the returned iterator
/// can be collected as many times as needed.
pub fn normalized_sentences<'a>(
    tokenizer: &'a dyn SentenceTokenizer,
    text: &'a str,
) -> impl Iterator<Item = String> + 'a {
    tokenizer
        .split(text)
        .into_iter()
        .map(|sentence| normalize(&sentence))
        .filter(|sentence| !sentence.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  The  Quick\t\nBrown FOX "), "the quick brown fox");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = ["  Hello   World  ", "already normalized", "", "\t\n", "MiXeD\u{a0}Case"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(normalize(" \t \n "), "");
    }

    #[test]
    fn empty_sentences_are_dropped() {
        struct BlankHappyTokenizer;

        impl SentenceTokenizer for BlankHappyTokenizer {
            fn split(&self, _text: &str) -> Vec<String> {
                vec!["First one.".to_string(), "   ".to_string(), String::new()]
            }
        }

        let sentences: Vec<String> =
            normalized_sentences(&BlankHappyTokenizer, "ignored").collect();
        assert_eq!(sentences, vec!["first one."]);
    }

    #[test]
    fn sentence_stream_is_restartable() {
        let tokenizer = RuleSentenceTokenizer::default();
        let text = "One sentence. Another sentence.";
        let first: Vec<String> = normalized_sentences(&tokenizer, text).collect();
        let second: Vec<String> = normalized_sentences(&tokenizer, text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
