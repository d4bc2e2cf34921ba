//! Clean raw generator output

/// Labels stripped from the start of a line, keeping what follows
const LABEL_PREFIXES: &[&str] = &[
    "transformed rumor:",
    "retold rumor:",
    "rumor:",
    "response:",
    "output:",
    "answer:",
];

/// Lines starting with these are chatter and get dropped
const PREAMBLE_PREFIXES: &[&str] = &["here is", "here's", "sure", "certainly", "okay", "of course"];

/// Lines starting with these end the useful part of the response
const TRAILER_PREFIXES: &[&str] = &["explanation:", "note:", "reasoning:"];

/// True if `line` starts with `prefix` as a whole word
fn starts_with_word(line: &str, prefix: &str) -> bool {
    if !line.starts_with(prefix) {
        return false;
    }
    if prefix.ends_with(':') {
        return true;
    }
    !line[prefix.len()..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric())
}

fn strip_wrapping_quotes(text: &str) -> &str {
    let pairs = [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')];
    for (open, close) in pairs {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            return inner.trim();
        }
    }
    text
}

/// Extract the retold rumor from a raw generator response
///
/// Markdown fences go, label prefixes are stripped, chatter lines are dropped
/// and everything after an explanation or note is ignored. Matching is
/// case-insensitive. Remaining lines are joined with single spaces.
pub fn clean_response(raw: &str) -> String {
    let mut kept: Vec<String> = Vec::new();

    for line in raw.lines() {
        let mut line = line.trim();
        if line.is_empty() || line.starts_with("```") {
            continue;
        }

        let lower = line.to_lowercase();
        if TRAILER_PREFIXES.iter().any(|p| starts_with_word(&lower, p)) {
            break;
        }
        if PREAMBLE_PREFIXES.iter().any(|p| starts_with_word(&lower, p)) {
            continue;
        }

        if let Some(prefix) = LABEL_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
            line = line.get(prefix.len()..).unwrap_or_default().trim();
        }

        let line = strip_wrapping_quotes(line);
        if !line.is_empty() {
            kept.push(line.to_string());
        }
    }

    let joined = kept.join(" ");
    strip_wrapping_quotes(joined.trim()).to_string()
}

/// Pull a truthfulness score out of a generator response
///
/// Takes the first number in the text. Values in [0, 1] are used as is,
/// values in (1, 100] are read as percentages. Anything else is `None`.
pub fn parse_score(response: &str) -> Option<f64> {
    let chars: Vec<char> = response.chars().collect();
    let start = chars.iter().enumerate().position(|(i, c)| {
        c.is_ascii_digit() || (*c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
    })?;

    let mut number = String::from("0");
    let mut seen_dot = false;
    for &c in &chars[start..] {
        if c.is_ascii_digit() {
            number.push(c);
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            number.push(c);
        } else {
            break;
        }
    }

    let value: f64 = number.trim_end_matches('.').parse().ok()?;
    if (0.0..=1.0).contains(&value) {
        Some(value)
    } else if value > 1.0 && value <= 100.0 {
        Some(value / 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_response() {
        assert_eq!(clean_response("  The king is dying.  "), "The king is dying.");
    }

    #[test]
    fn test_clean_strips_labels_and_preamble() {
        let raw = "Sure! Here's the retelling:\nTransformed Rumor: \"The king is dying.\"\n\nExplanation: I exaggerated.";
        assert_eq!(clean_response(raw), "The king is dying.");

        assert_eq!(clean_response("RESPONSE: The mill burned down"), "The mill burned down");
        assert_eq!(clean_response("Certainly.\nOutput:\nThe mill burned down"), "The mill burned down");
    }

    #[test]
    fn test_clean_keeps_words_that_merely_start_like_chatter() {
        assert_eq!(
            clean_response("Surely the baron knew all along"),
            "Surely the baron knew all along"
        );
    }

    #[test]
    fn test_clean_markdown_fence() {
        let raw = "```\nThe well is poisoned\n```";
        assert_eq!(clean_response(raw), "The well is poisoned");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_response(""), "");
        assert_eq!(clean_response("Note: nothing to say"), "");
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("0.75"), Some(0.75));
        assert_eq!(parse_score("Truthfulness: 0.4 out of 1"), Some(0.4));
        assert_eq!(parse_score("85%"), Some(0.85));
        assert_eq!(parse_score("1"), Some(1.0));
        assert_eq!(parse_score(".5"), Some(0.5));
        assert_eq!(parse_score("The rumor. 0.5"), Some(0.5));
        assert_eq!(parse_score("about 250"), None);
        assert_eq!(parse_score("no idea"), None);
    }
}
