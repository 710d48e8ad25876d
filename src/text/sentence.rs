/// Sentence boundary detection behind a seam so the exact-match scan can be
/// exercised with canned tokenizers in tests.
pub trait SentenceTokenizer: Send + Sync {
    /// Split a text into sentences, in document order. Implementations must
    /// not merge or reorder content, only segment it.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Abbreviations that end with a period without terminating a sentence.
/// Stored lowercase, without the trailing period.
const ABBREVIATIONS: &[&str] = &[
    "al", "apr", "aug", "ave", "co", "corp", "dec", "dept", "dr", "e.g", "etc", "feb", "fig",
    "gen", "gov", "i.e", "inc", "jan", "jr", "jul", "jun", "ltd", "mar", "messrs", "mr", "mrs",
    "ms", "mt", "no", "nov", "oct", "p", "ph.d", "pp", "prof", "rev", "sen", "sep", "sgt", "sr",
    "st", "u.s", "vol", "vs",
];

/// Rule-based sentence splitter. Treats `.`, `!` and `?` as terminators but
/// keeps going through abbreviations (`Dr.`, `e.g.`), single-letter initials
/// and decimal numbers, and only breaks when the following text looks like a
/// new sentence.
#[derive(Debug, Default, Clone)]
pub struct RuleSentenceTokenizer;

impl SentenceTokenizer for RuleSentenceTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if ch == '!' || ch == '?' || ch == '.' {
                // swallow runs of terminators and trailing quotes/brackets
                let mut end = i + 1;
                while end < chars.len() && matches!(chars[end], '.' | '!' | '?' | '"' | '\'' | ')' | ']') {
                    end += 1;
                }

                if is_boundary(&chars, start, i, end) {
                    push_sentence(&mut sentences, &chars[start..end]);
                    start = end;
                }
                i = end;
            } else {
                i += 1;
            }
        }

        if start < chars.len() {
            push_sentence(&mut sentences, &chars[start..]);
        }

        sentences
    }
}

fn push_sentence(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence: String = chars.iter().collect();
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

/// Decide whether the terminator at `pos` (with trailing punctuation swallowed
/// up to `end`) closes the sentence that began at `start`.
fn is_boundary(chars: &[char], start: usize, pos: usize, end: usize) -> bool {
    // end of input always closes
    let next = chars[end..].iter().find(|c| !c.is_whitespace());
    let Some(&next) = next else { return true };

    if chars[pos] == '.' {
        // decimal numbers: 3.14
        let prev = pos.checked_sub(1).map(|p| chars[p]);
        if prev.is_some_and(|c| c.is_ascii_digit()) && pos + 1 < chars.len() && chars[pos + 1].is_ascii_digit() {
            return false;
        }

        let word = word_before(chars, start, pos);
        // single-letter initials ("J. K. Rowling") and known abbreviations
        if word.chars().count() == 1 && word.chars().all(|c| c.is_alphabetic()) {
            return false;
        }
        if ABBREVIATIONS.contains(&word.as_str()) {
            return false;
        }

        // a following lowercase letter means the sentence continues
        if next.is_lowercase() {
            return false;
        }
    }

    // new sentences open with an uppercase letter, a digit or a quote
    next.is_uppercase() || next.is_numeric() || matches!(next, '"' | '\'' | '(' | '[')
}

/// The lowercased word immediately preceding `pos`, dots kept so multi-part
/// abbreviations like `e.g` survive, surrounding dots stripped.
fn word_before(chars: &[char], start: usize, pos: usize) -> String {
    let mut begin = pos;
    while begin > start {
        let c = chars[begin - 1];
        if c.is_alphanumeric() || c == '.' {
            begin -= 1;
        } else {
            break;
        }
    }
    let word: String = chars[begin..pos].iter().collect::<String>().to_lowercase();
    word.trim_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        RuleSentenceTokenizer.split(text)
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split("One ends here. Two ends there! Three asks? Four trails");
        assert_eq!(
            sentences,
            vec![
                "One ends here.",
                "Two ends there!",
                "Three asks?",
                "Four trails"
            ]
        );
    }

    #[test]
    fn keeps_abbreviations_together() {
        let sentences = split("Dr. Smith arrived at 9. He was late.");
        assert_eq!(sentences, vec!["Dr. Smith arrived at 9.", "He was late."]);
    }

    #[test]
    fn keeps_decimals_together() {
        let sentences = split("Pi is roughly 3.14 in most uses. Everyone knows that.");
        assert_eq!(
            sentences,
            vec!["Pi is roughly 3.14 in most uses.", "Everyone knows that."]
        );
    }

    #[test]
    fn keeps_initials_together() {
        let sentences = split("J. K. Rowling wrote it. It sold well.");
        assert_eq!(sentences, vec!["J. K. Rowling wrote it.", "It sold well."]);
    }

    #[test]
    fn lowercase_continuation_does_not_split() {
        let sentences = split("It cost 5 dollars approx. per unit sold.");
        assert_eq!(sentences, vec!["It cost 5 dollars approx. per unit sold."]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split("").is_empty());
        assert!(split("   \n\t").is_empty());
    }
}
