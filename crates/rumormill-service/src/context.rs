//! Narrative rendering of rumor summaries

use crate::types::RumorContextEntry;

/// How an entity's belief reads in prose
fn belief_phrase(believability: f64) -> &'static str {
    if believability > 0.8 {
        "strongly believes"
    } else if believability > 0.5 {
        "believes"
    } else if believability > 0.2 {
        "is somewhat skeptical of"
    } else {
        "doubts"
    }
}

/// How widely held a rumor is, from its average believability
fn consensus_phrase(average_believability: f64) -> &'static str {
    if average_believability > 0.8 {
        "widely believed"
    } else if average_believability > 0.5 {
        "generally accepted"
    } else if average_believability > 0.2 {
        "somewhat doubted"
    } else {
        "generally disbelieved"
    }
}

fn reach_phrase(spread_count: usize) -> &'static str {
    if spread_count > 10 {
        "widely known"
    } else if spread_count > 5 {
        "somewhat known"
    } else {
        "barely known"
    }
}

/// Render context entries as numbered lines of prose
///
/// With an entity the lines read "1. npc_1 strongly believes that ...";
/// without one they describe how known and believed each rumor is.
///
/// # Examples
///
/// ```
/// use rumormill_domain::{RumorId, RumorSeverity};
/// use rumormill_service::{render_rumor_context, RumorContextEntry};
///
/// let entry = RumorContextEntry {
///     rumor_id: RumorId::new(),
///     content: "The king is ill".to_string(),
///     believability: 0.9,
///     truth_value: 0.8,
///     severity: RumorSeverity::Major,
///     categories: Vec::new(),
///     spread_count: 1,
/// };
/// assert_eq!(
///     render_rumor_context(Some("npc_1"), &[entry]),
///     "1. npc_1 strongly believes that The king is ill"
/// );
/// ```
pub fn render_rumor_context(entity_id: Option<&str>, entries: &[RumorContextEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entity_id {
            Some(entity) => format!(
                "{}. {} {} that {}",
                i + 1,
                entity,
                belief_phrase(entry.believability),
                entry.content
            ),
            None => format!(
                "{}. It is {} and {} that {}",
                i + 1,
                reach_phrase(entry.spread_count),
                consensus_phrase(entry.believability),
                entry.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
