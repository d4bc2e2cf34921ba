//! Rule-based mutation used when the generator is unavailable
//!
//! Deterministic for a given random source, so tests seed a `StdRng`.

use rand::seq::index;
use rand::Rng;

/// Words that already intensify the word after them
const INTENSIFIERS: &[&str] = &["very", "extremely", "really", "incredibly", "truly"];

const BIG_WORDS: &[&str] = &["big", "large", "huge"];
const SMALL_WORDS: &[&str] = &["small", "tiny", "little"];

/// Split a token into leading punctuation, core word and trailing punctuation
pub(crate) fn split_token(token: &str) -> (&str, &str, &str) {
    let start = token
        .char_indices()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let end = token
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start)
        .max(start);
    (&token[..start], &token[start..end], &token[end..])
}

/// Copy the capitalisation of `original`'s first letter onto `replacement`
pub(crate) fn match_case(original: &str, replacement: &str) -> String {
    let capitalised = original.chars().next().is_some_and(|c| c.is_uppercase());
    if !capitalised {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_intensified(words: &[&str], position: usize) -> bool {
    let (_, core, _) = split_token(words[position]);
    let core = core.to_lowercase();
    if INTENSIFIERS.contains(&core.as_str()) {
        return true;
    }
    position > 0 && {
        let (_, previous, _) = split_token(words[position - 1]);
        INTENSIFIERS.contains(&previous.to_lowercase().as_str())
    }
}

fn intensify(token: &str) -> String {
    let (lead, core, trail) = split_token(token);
    if core.is_empty() {
        return format!("very {}", token);
    }
    format!("{}{} {}{}", lead, match_case(core, "very"), lowercase_first_if_capitalised(core), trail)
}

/// Articles and determiners read better lowercased after an inserted "Very"
const LOWERCASE_AFTER_VERY: &[&str] = &["the", "a", "an", "this", "that", "his", "her", "their", "my", "our"];

fn lowercase_first_if_capitalised(core: &str) -> String {
    let lower = core.to_lowercase();
    if LOWERCASE_AFTER_VERY.contains(&lower.as_str()) {
        lower
    } else {
        core.to_string()
    }
}

/// Apply one local edit to a word, if a rule fires
fn edit_word<R: Rng + ?Sized>(words: &[&str], position: usize, rng: &mut R) -> Option<String> {
    let token = words[position];
    let (lead, core, trail) = split_token(token);
    if core.is_empty() {
        return None;
    }

    if core.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = core.parse::<u64>() {
            let factor: u64 = rng.random_range(2..=5);
            let scaled = n.saturating_mul(factor);
            if scaled != n {
                return Some(format!("{}{}{}", lead, scaled, trail));
            }
        }
    }

    let lower = core.to_lowercase();
    if BIG_WORDS.contains(&lower.as_str()) {
        return Some(format!("{}{}{}", lead, match_case(core, "enormous"), trail));
    }
    if SMALL_WORDS.contains(&lower.as_str()) {
        return Some(format!("{}{}{}", lead, match_case(core, "minuscule"), trail));
    }

    if !is_intensified(words, position) && rng.random_bool(0.5) {
        return Some(intensify(token));
    }
    None
}

/// Number of word positions edited for `word_count` words at `level`
///
/// `max(1, min(word_count / 3, floor(word_count * level * 0.5)))`
pub fn edit_budget(word_count: usize, level: f64) -> usize {
    let scaled = (word_count as f64 * level * 0.5).floor().max(0.0) as usize;
    (word_count / 3).min(scaled).max(1).min(word_count)
}

/// Mutate a tokenized sentence in place-aligned form
///
/// Returns one entry per input word: either the word itself or its edited
/// form (an intensified word becomes "very word"). At least one and at most
/// [`edit_budget`] entries differ from the input, unless no word can be
/// edited at all.
pub fn mutate_words<R: Rng + ?Sized>(words: &[&str], level: f64, rng: &mut R) -> Vec<String> {
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    if words.is_empty() {
        return out;
    }

    let budget = edit_budget(words.len(), level);
    let mut positions = index::sample(rng, words.len(), budget).into_vec();
    positions.sort_unstable();

    let mut changed = false;
    for &position in &positions {
        if let Some(edited) = edit_word(words, position, rng) {
            out[position] = edited;
            changed = true;
        }
    }

    if !changed {
        let forced = positions
            .iter()
            .copied()
            .find(|&p| !is_intensified(words, p))
            .or_else(|| (0..words.len()).find(|&p| !is_intensified(words, p)));
        if let Some(position) = forced {
            out[position] = intensify(words[position]);
        }
    }

    out
}

/// Rule-based retelling of `text`
///
/// No-op below `threshold`. Otherwise a handful of randomly chosen words are
/// exaggerated: numbers multiplied by 2 to 5, size words pushed to extremes,
/// and plain words intensified with "very".
pub fn fallback_transform<R: Rng + ?Sized>(text: &str, level: f64, threshold: f64, rng: &mut R) -> String {
    if level.is_nan() || level < threshold {
        return text.to_string();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return text.to_string();
    }
    mutate_words(&words, level, rng).join(" ")
}
