use std::collections::BTreeSet;

/// Lowercase, replace ASCII punctuation (except `-` and `'`) with spaces,
/// collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let spaced: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_punctuation() && c != '-' && c != '\'' {
                ' '
            } else {
                c
            }
        })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp a confidence into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Keep at most `max_words` words, appending "..." when anything was cut.
/// Text within the budget is returned untouched.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Jaccard similarity of the normalized word sets of two texts.
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = normalize(a).split(' ').filter(|w| !w.is_empty()).map(String::from).collect();
    let set_b: BTreeSet<String> = normalize(b).split(' ').filter(|w| !w.is_empty()).map(String::from).collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let inter = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Normalizer Tests ====================

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_normalize_keeps_hyphens_and_apostrophes() {
        assert_eq!(
            normalize("Pro-choice activists won't stop."),
            "pro-choice activists won't stop"
        );
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  tax\t\tcuts \n and   more  "), "tax cuts and more");
    }

    #[test]
    fn test_normalize_punctuation_between_words_becomes_space() {
        assert_eq!(normalize("free/market"), "free market");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("?!."), "");
    }

    // ==================== Utility Tests ====================

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.283333), 0.28);
        assert_eq!(round2(-0.456), -0.46);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.4), 0.4);
    }

    #[test]
    fn test_truncate_words_within_budget_is_untouched() {
        assert_eq!(truncate_words("one  two three", 3), "one  two three");
    }

    #[test]
    fn test_truncate_words_cuts_and_marks() {
        assert_eq!(truncate_words("one two three four", 2), "one two...");
    }

    #[test]
    fn test_char_prefix_respects_multibyte() {
        assert_eq!(char_prefix("héllo wörld", 4), "héll");
        assert_eq!(char_prefix("short", 100), "short");
    }

    #[test]
    fn test_word_jaccard() {
        assert_eq!(word_jaccard("Tax cuts pass", "tax cuts pass!"), 1.0);
        assert_eq!(word_jaccard("alpha beta", "gamma delta"), 0.0);
        assert!((word_jaccard("a b c d", "a b c e") - 0.6).abs() < 1e-9);
    }
}
