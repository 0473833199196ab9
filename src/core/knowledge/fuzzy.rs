//! Levenshtein-based partial similarity on a 0-100 scale.
//!
//! `partial_ratio` slides the shorter string across the longer one and keeps
//! the best window, so "etosha" scores 100 against "Etosha National Park".

use strsim::normalized_levenshtein;

/// Windows longer than this are not worth sliding character by character.
const MAX_WINDOW_SCAN: usize = 2_000;

/// Best similarity between the shorter string and any same-length window of
/// the longer one, 0-100. An exact substring scores 100; empty input scores 0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    if long.contains(short.as_str()) {
        return 100.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let window = short.chars().count();
    let last_start = long_chars.len() - window;

    let mut best = 0.0_f64;
    for start in 0..=last_start.min(MAX_WINDOW_SCAN) {
        let candidate: String = long_chars[start..start + window].iter().collect();
        let score = normalized_levenshtein(&short, &candidate);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }

    best * 100.0
}

/// Share of `tokens` found among the words of `field`, 0-100.
///
/// A token also counts when it is the stem of a field word ("elephant" in
/// "elephants") or the other way round for words of four letters or more.
/// Catches multi-word queries whose words are scattered through the field,
/// which a single sliding window misses.
pub fn token_coverage(tokens: &[String], field: &str) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }

    let words: Vec<String> = field
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let hits = tokens
        .iter()
        .filter(|token| {
            words.iter().any(|word| {
                word.starts_with(token.as_str())
                    || (word.chars().count() >= 4 && token.starts_with(word.as_str()))
            })
        })
        .count();

    hits as f64 / tokens.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_is_perfect() {
        assert_eq!(partial_ratio("etosha", "Etosha National Park"), 100.0);
        assert_eq!(partial_ratio("Etosha National Park", "etosha"), 100.0);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert_eq!(partial_ratio("anything", "   "), 0.0);
    }

    #[test]
    fn test_typo_still_scores_high() {
        // One substitution in six characters
        let score = partial_ratio("etoshs", "Tell me about Etosha National Park");
        assert!(score > 80.0, "score was {score}");
    }

    #[test]
    fn test_unrelated_scores_low() {
        let score = partial_ratio("xyzabc123", "The capital of Namibia is Windhoek.");
        assert!(score < 60.0, "score was {score}");
    }

    #[test]
    fn test_token_coverage_scattered_words() {
        let tokens = vec!["capital".to_string(), "namibia".to_string()];
        assert_eq!(token_coverage(&tokens, "Capital of Namibia"), 100.0);
        assert_eq!(token_coverage(&tokens, "Where is Namibia"), 50.0);
        assert_eq!(token_coverage(&[], "Where is Namibia"), 0.0);
    }

    #[test]
    fn test_token_coverage_plural_stems() {
        let tokens = vec!["elephants".to_string()];
        assert_eq!(token_coverage(&tokens, "Desert Adapted Elephant"), 100.0);
    }
}
