//! Variant - one wording of a rumor

use crate::VariantId;
use std::collections::BTreeMap;

/// One specific telling of a rumor
///
/// Variants form a tree: `parent_variant_id` points at the wording this one
/// was mutated from, and a parent always exists before its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Unique identifier
    pub id: VariantId,

    /// The words of this telling
    pub content: String,

    /// When this variant was created (seconds since Unix epoch)
    pub created_at: u64,

    /// Variant this one was derived from, `None` for the original telling
    pub parent_variant_id: Option<VariantId>,

    /// Entity that produced this wording
    pub entity_id: String,

    /// Free-form notes about how the mutation happened
    pub mutation_metadata: BTreeMap<String, String>,
}

impl Variant {
    /// Create the root variant of a rumor
    pub fn original(content: impl Into<String>, entity_id: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: VariantId::new(),
            content: content.into(),
            created_at,
            parent_variant_id: None,
            entity_id: entity_id.into(),
            mutation_metadata: BTreeMap::new(),
        }
    }

    /// Whether this is the originator's own telling
    pub fn is_original(&self) -> bool {
        self.parent_variant_id.is_none()
    }

    /// Short preview of the content for logs and events
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.content, max_chars)
    }
}

/// Truncate `text` to `max_chars` characters, appending an ellipsis if cut
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_variant() {
        let v = Variant::original("The king is ill", "npc_1", 1000);
        assert!(v.is_original());
        assert_eq!(v.entity_id, "npc_1");
        assert!(v.mutation_metadata.is_empty());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }
}
