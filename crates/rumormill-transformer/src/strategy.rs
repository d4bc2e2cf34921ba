//! Typed mutation strategies
//!
//! Each [`MutationKind`] is a family of rewrite rules (certainty creep,
//! inflated numbers, borrowed authority...). A weighted draw over the teller's
//! situation picks which family fires, so a dramatic, frightened teller
//! embellishes differently from a calm gossip.

use crate::fallback::{match_case, mutate_words, split_token};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Family of rewrite applied to a retelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Words drift toward stronger meanings ("planning" becomes "plotting")
    SemanticShift,
    /// Alarm and urgency are added
    EmotionalAmplification,
    /// Numbers grow and dates slide
    DetailDistortion,
    /// The story is framed as second-hand testimony
    PerspectiveChange,
    /// Possibilities become accomplished facts
    TemporalShift,
    /// Coincidence becomes intent
    CausalityModification,
    /// The story is credited to officials
    AuthorityTransfer,
    /// Consequences are blown up to the whole region
    ScopeExpansion,
}

impl MutationKind {
    /// Every kind, in a fixed order
    pub const ALL: [MutationKind; 8] = [
        MutationKind::SemanticShift,
        MutationKind::DetailDistortion,
        MutationKind::EmotionalAmplification,
        MutationKind::PerspectiveChange,
        MutationKind::TemporalShift,
        MutationKind::CausalityModification,
        MutationKind::AuthorityTransfer,
        MutationKind::ScopeExpansion,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::SemanticShift => "semantic_shift",
            MutationKind::EmotionalAmplification => "emotional_amplification",
            MutationKind::DetailDistortion => "detail_distortion",
            MutationKind::PerspectiveChange => "perspective_change",
            MutationKind::TemporalShift => "temporal_shift",
            MutationKind::CausalityModification => "causality_modification",
            MutationKind::AuthorityTransfer => "authority_transfer",
            MutationKind::ScopeExpansion => "scope_expansion",
        }
    }

    /// Parse a kind name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }

    /// Weight before the teller's situation is taken into account
    pub fn base_weight(&self) -> f64 {
        match self {
            MutationKind::SemanticShift => 1.0,
            MutationKind::DetailDistortion => 1.0,
            MutationKind::EmotionalAmplification => 0.5,
            MutationKind::PerspectiveChange => 0.7,
            MutationKind::TemporalShift => 0.6,
            MutationKind::CausalityModification => 0.4,
            MutationKind::AuthorityTransfer => 0.8,
            MutationKind::ScopeExpansion => 0.5,
        }
    }

    /// Instruction given to the text generator for this kind
    pub fn guidance(&self) -> &'static str {
        match self {
            MutationKind::SemanticShift => "Swap words for stronger ones: plans become plots, maybes become certainties.",
            MutationKind::EmotionalAmplification => "Make it sound alarming and urgent.",
            MutationKind::DetailDistortion => "Inflate the numbers and blur when things happened.",
            MutationKind::PerspectiveChange => "Tell it as something a cousin or a friend in the know let slip.",
            MutationKind::TemporalShift => "Treat what might happen as something already under way.",
            MutationKind::CausalityModification => "Suggest that nothing about it was an accident.",
            MutationKind::AuthorityTransfer => "Credit the story to officials or other important sources.",
            MutationKind::ScopeExpansion => "Hint that the consequences reach far beyond the people involved.",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is known about the teller and the rumor's history
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationSignals<'a> {
    /// Personality traits of the teller
    pub traits: &'a [String],
    /// Teller's mood, e.g. "angry" or "fearful"
    pub emotional_state: Option<&'a str>,
    /// Pressure to have something worth telling, in [0, 1]
    pub social_pressure: f64,
    /// Days since the rumor started
    pub days_since_original: f64,
    /// Retellings between the original and the wording being passed on
    pub chain_depth: usize,
}

impl MutationSignals<'_> {
    fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.trim().eq_ignore_ascii_case(name))
    }

    fn in_state(&self, states: &[&str]) -> bool {
        self.emotional_state
            .is_some_and(|state| states.iter().any(|s| state.trim().eq_ignore_ascii_case(s)))
    }
}

/// Weight of every kind for this teller at `intensity`
pub fn mutation_weights(signals: &MutationSignals<'_>, intensity: f64) -> [(MutationKind, f64); 8] {
    let mut weights = MutationKind::ALL.map(|kind| (kind, kind.base_weight()));
    let mut scale = |target: MutationKind, factor: f64| {
        for (kind, weight) in weights.iter_mut() {
            if *kind == target {
                *weight *= factor;
            }
        }
    };

    if signals.has_trait("dramatic") {
        scale(MutationKind::EmotionalAmplification, 2.0);
        scale(MutationKind::ScopeExpansion, 1.5);
    }
    if signals.has_trait("gossipy") {
        scale(MutationKind::DetailDistortion, 1.5);
        scale(MutationKind::AuthorityTransfer, 1.3);
    }
    if signals.in_state(&["angry", "fearful"]) {
        scale(MutationKind::EmotionalAmplification, 1.8);
    }
    if signals.days_since_original > 0.5 {
        scale(MutationKind::TemporalShift, 1.5);
        scale(MutationKind::DetailDistortion, 1.3);
    }
    if intensity > 0.7 {
        scale(MutationKind::ScopeExpansion, 1.4);
        scale(MutationKind::CausalityModification, 1.2);
    }
    weights
}

/// Weighted draw of the next kind to apply
pub fn select_mutation_kind<R: Rng + ?Sized>(signals: &MutationSignals<'_>, intensity: f64, rng: &mut R) -> MutationKind {
    let weights = mutation_weights(signals, intensity);
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    let mut draw = rng.random_range(0.0..total);
    for (kind, weight) in weights {
        if draw < weight {
            return kind;
        }
        draw -= weight;
    }
    // Rounding can leave a sliver past the last bucket
    weights[weights.len() - 1].0
}

/// Number of rewrites attempted for one retelling
///
/// `max(1, floor(intensity * 4))`, plus one each for a long chain (more than
/// three retellings), high social pressure (above 0.7) and an excited, angry
/// or fearful teller.
pub fn attempt_count(signals: &MutationSignals<'_>, intensity: f64) -> usize {
    let mut attempts = ((intensity * 4.0).floor().max(0.0) as usize).max(1);
    if signals.chain_depth > 3 {
        attempts += 1;
    }
    if signals.social_pressure > 0.7 {
        attempts += 1;
    }
    if signals.in_state(&["excited", "angry", "fearful"]) {
        attempts += 1;
    }
    attempts
}

const WORD_SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("planning", &["plotting", "scheming", "conspiring", "orchestrating"]),
    ("meeting", &["secretly gathering", "conspiring", "plotting together"]),
    ("discussing", &["whispering about", "secretly planning", "quietly organizing"]),
    ("considering", &["actively pursuing", "definitely planning", "committed to"]),
    ("angry", &["furious", "enraged", "livid", "seething"]),
    ("worried", &["terrified", "panicked", "desperately concerned"]),
    ("surprised", &["shocked", "stunned", "devastated"]),
    ("someone", &["a high-ranking official", "multiple sources", "insider contacts"]),
    ("people", &["influential circles", "those in power", "the inner circle"]),
    ("might", &["will definitely", "is confirmed to", "has been proven to"]),
    ("could", &["is going to", "will certainly", "has already begun to"]),
    ("possibly", &["undoubtedly", "without question", "absolutely"]),
    ("maybe", &["definitely", "for certain", "beyond doubt"]),
    ("was seen", &["was caught", "was discovered"]),
];

const NUMBER_MULTIPLIERS: &[u64] = &[2, 3, 5, 10];
const NUMBER_QUALIFIERS: &[&str] = &["at least", "over", "more than", "upwards of"];

const TIME_DISTORTIONS: &[(&str, &[&str])] = &[
    ("yesterday", &["last week", "recently", "not long ago"]),
    ("last week", &["last month", "a while back", "some time ago"]),
    ("recently", &["months ago", "a long time ago", "ages ago"]),
    ("next week", &["tomorrow", "very soon", "within days"]),
    ("soon", &["immediately", "any moment", "within hours"]),
];

const LOW_ALARM: &[&str] = &["concerning", "troubling", "worrying", "disturbing"];
const MEDIUM_ALARM: &[&str] = &["alarming", "shocking", "devastating", "catastrophic"];
const HIGH_ALARM: &[&str] = &["apocalyptic", "world-ending", "civilization-threatening"];

const ALARM_PREFIXES: &[&str] = &[
    "Absolutely devastating:",
    "Shocking revelation:",
    "Unbelievable news:",
    "Urgent warning:",
];
const CONSPIRACY_MARKERS: &[&str] = &[
    "What they don't want you to know:",
    "The truth they're hiding:",
    "Insider sources confirm:",
];
const URGENCY_SUFFIXES: &[&str] = &[
    " - this changes everything!",
    " - spread the word before it's too late!",
    " - they're trying to cover this up!",
];

const HEARSAY_CLAIMS: &[&str] = &[
    "My cousin in the guard told me",
    "A friend who works in the castle said",
    "Someone with inside knowledge revealed",
    "A merchant who deals with them mentioned",
];

const TEMPORAL_SHIFTS: &[(&str, &str)] = &[
    ("will", "has already"),
    ("is going to", "has begun to"),
    ("might", "is definitely going to"),
    ("could", "will certainly"),
    ("planning", "actively doing"),
    ("considering", "committed to"),
];

const CAUSAL_LINKS: &[(&str, &str)] = &[
    ("because", "precisely because"),
    ("after", "right after"),
    ("when", "just as"),
];
const HIDDEN_INTENT: &[&str] = &["and it was no accident", "and someone made sure of it"];

const AUTHORITY_SOURCES: &[&str] = &[
    "According to palace sources,",
    "Official reports confirm that",
    "The magistrate's clerks say",
    "High-ranking officials state that",
];

const SCOPE_OPENERS: &[&str] = &["What's worse,", "But that's not all -", "The real problem is that"];
const SCOPE_IMPLICATIONS: &[&str] = &[
    "this affects everyone in the city",
    "similar things are happening elsewhere",
    "this is part of a larger pattern",
];

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Byte offset of `phrase` as a whole word, ignoring ASCII case
///
/// `phrase` must be lowercase ASCII.
fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(offset) = lower[from..].find(phrase) {
        let start = from + offset;
        let end = start + phrase.len();
        let clear_before = lower[..start].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let clear_after = lower[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if clear_before && clear_after {
            return Some(start);
        }
        from = start + 1;
    }
    None
}

/// Replace the first whole-word `phrase`, keeping its capitalisation
fn replace_phrase(text: &str, phrase: &str, replacement: &str) -> Option<String> {
    let start = find_phrase(text, phrase)?;
    let end = start + phrase.len();
    Some(format!(
        "{}{}{}",
        &text[..start],
        match_case(&text[start..end], replacement),
        &text[end..]
    ))
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn without_final_stop(text: &str) -> &str {
    text.trim_end().trim_end_matches(['.', '!', '?'])
}

fn semantic_shift<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    let mut out = text.to_string();
    for (word, replacements) in WORD_SUBSTITUTIONS {
        if find_phrase(&out, word).is_none() {
            continue;
        }
        let replacement = if intensity > 0.7 {
            replacements[replacements.len() - 1]
        } else if intensity > 0.4 {
            pick(&replacements[1..], rng)
        } else {
            pick(&replacements[..2], rng)
        };
        if let Some(replaced) = replace_phrase(&out, word, replacement) {
            out = replaced;
        }
    }
    out
}

fn detail_distortion<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            let (lead, core, trail) = split_token(token);
            match core.parse::<u64>() {
                Ok(n) if core.chars().all(|c| c.is_ascii_digit()) => {
                    let multiplier = NUMBER_MULTIPLIERS[rng.random_range(0..NUMBER_MULTIPLIERS.len())];
                    let inflated = n.saturating_mul(multiplier);
                    if intensity > 0.6 {
                        format!("{}{} {}{}", lead, pick(NUMBER_QUALIFIERS, rng), inflated, trail)
                    } else {
                        format!("{}{}{}", lead, inflated, trail)
                    }
                }
                _ => token.to_string(),
            }
        })
        .collect();
    let mut out = tokens.join(" ");

    if let Some((phrase, replacements)) = TIME_DISTORTIONS.iter().find(|(p, _)| find_phrase(&out, p).is_some()) {
        let replacement = if intensity > 0.5 {
            replacements[replacements.len() - 1]
        } else {
            pick(&replacements[..2], rng)
        };
        if let Some(replaced) = replace_phrase(&out, phrase, replacement) {
            out = replaced;
        }
    }
    out
}

fn emotional_amplification<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    let mut out = text.to_string();

    if intensity > 0.6 {
        if let Some(word) = LOW_ALARM.iter().find(|w| find_phrase(&out, w).is_some()) {
            if let Some(replaced) = replace_phrase(&out, word, pick(MEDIUM_ALARM, rng)) {
                out = replaced;
            }
        }
    }
    if intensity > 0.8 {
        if let Some(word) = MEDIUM_ALARM.iter().find(|w| find_phrase(&out, w).is_some()) {
            if let Some(replaced) = replace_phrase(&out, word, pick(HIGH_ALARM, rng)) {
                out = replaced;
            }
        }
    }

    if intensity > 0.7 && rng.random_bool(0.4) {
        out = format!("{} {}", pick(ALARM_PREFIXES, rng), out);
    }
    if intensity > 0.6 && rng.random_bool(0.3) {
        out = format!("{} {}", pick(CONSPIRACY_MARKERS, rng), out);
    }
    if intensity > 0.5 && rng.random_bool(0.5) {
        out = format!("{}{}", without_final_stop(&out), pick(URGENCY_SUFFIXES, rng));
    }
    out
}

fn perspective_change<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    if intensity > 0.4 && rng.random_bool(0.6) {
        format!("{} that {}", pick(HEARSAY_CLAIMS, rng), lowercase_first(text))
    } else {
        text.to_string()
    }
}

fn temporal_shift(text: &str) -> String {
    TEMPORAL_SHIFTS
        .iter()
        .find_map(|(phrase, replacement)| replace_phrase(text, phrase, replacement))
        .unwrap_or_else(|| text.to_string())
}

fn causality_modification<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    if let Some(linked) = CAUSAL_LINKS
        .iter()
        .find_map(|(phrase, replacement)| replace_phrase(text, phrase, replacement))
    {
        return linked;
    }
    if intensity > 0.5 && rng.random_bool(0.5) {
        format!("{}, {}.", without_final_stop(text), pick(HIDDEN_INTENT, rng))
    } else {
        text.to_string()
    }
}

fn authority_transfer<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    if intensity > 0.5 && rng.random_bool(0.4) {
        format!("{} {}", pick(AUTHORITY_SOURCES, rng), lowercase_first(text))
    } else {
        text.to_string()
    }
}

fn scope_expansion<R: Rng + ?Sized>(text: &str, intensity: f64, rng: &mut R) -> String {
    if intensity > 0.6 && rng.random_bool(0.3) {
        format!(
            "{}. {} {}.",
            without_final_stop(text),
            pick(SCOPE_OPENERS, rng),
            pick(SCOPE_IMPLICATIONS, rng)
        )
    } else {
        text.to_string()
    }
}

/// Apply one kind of rewrite; `None` when its rules did not fire
pub fn apply_mutation<R: Rng + ?Sized>(kind: MutationKind, text: &str, intensity: f64, rng: &mut R) -> Option<String> {
    let rewritten = match kind {
        MutationKind::SemanticShift => semantic_shift(text, intensity, rng),
        MutationKind::EmotionalAmplification => emotional_amplification(text, intensity, rng),
        MutationKind::DetailDistortion => detail_distortion(text, intensity, rng),
        MutationKind::PerspectiveChange => perspective_change(text, intensity, rng),
        MutationKind::TemporalShift => temporal_shift(text),
        MutationKind::CausalityModification => causality_modification(text, intensity, rng),
        MutationKind::AuthorityTransfer => authority_transfer(text, intensity, rng),
        MutationKind::ScopeExpansion => scope_expansion(text, intensity, rng),
    };
    (rewritten != text).then_some(rewritten)
}

/// Retelling produced by [`mutate_with_strategies`]
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    /// The retold rumor
    pub text: String,
    /// Kinds whose rules changed the text, in order
    pub applied: Vec<MutationKind>,
}

/// Rule-based retelling driven by typed strategies
///
/// Below `threshold` nothing changes. Otherwise [`attempt_count`] kinds are
/// drawn with [`select_mutation_kind`] and applied in turn. If none of them
/// fired, the word-level edits of the plain fallback are used instead.
pub fn mutate_with_strategies<R: Rng + ?Sized>(
    text: &str,
    signals: &MutationSignals<'_>,
    intensity: f64,
    threshold: f64,
    rng: &mut R,
) -> StrategyOutcome {
    if intensity.is_nan() || intensity < threshold || text.trim().is_empty() {
        return StrategyOutcome {
            text: text.to_string(),
            applied: Vec::new(),
        };
    }

    let mut current = text.to_string();
    let mut applied = Vec::new();
    for _ in 0..attempt_count(signals, intensity) {
        let kind = select_mutation_kind(signals, intensity, rng);
        if let Some(rewritten) = apply_mutation(kind, &current, intensity, rng) {
            current = rewritten;
            applied.push(kind);
        }
    }

    if applied.is_empty() {
        let words: Vec<&str> = text.split_whitespace().collect();
        current = mutate_words(&words, intensity, rng).join(" ");
    }

    StrategyOutcome {
        text: current,
        applied,
    }
}

/// How a rumor drifted over a chain of retellings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationChainAnalysis {
    /// Rewrites applied along the chain
    pub total_mutations: usize,
    /// Count per kind
    pub mutation_types: BTreeMap<MutationKind, usize>,
    /// Share of rewrites that raised alarm or scope
    pub emotional_amplification: f64,
    /// Share of rewrites that borrowed authority or testimony
    pub authority_escalation: f64,
}

/// Summarise the kinds applied along a chain of retellings
pub fn analyze_mutation_chain(history: &[MutationKind]) -> MutationChainAnalysis {
    let mut mutation_types = BTreeMap::new();
    for kind in history {
        *mutation_types.entry(*kind).or_insert(0) += 1;
    }
    let count = |kinds: [MutationKind; 2]| -> usize { kinds.iter().filter_map(|k| mutation_types.get(k)).sum() };
    let emotional = count([MutationKind::EmotionalAmplification, MutationKind::ScopeExpansion]);
    let authority = count([MutationKind::AuthorityTransfer, MutationKind::PerspectiveChange]);
    let denominator = history.len().max(1) as f64;

    MutationChainAnalysis {
        total_mutations: history.len(),
        emotional_amplification: emotional as f64 / denominator,
        authority_escalation: authority as f64 / denominator,
        mutation_types,
    }
}
