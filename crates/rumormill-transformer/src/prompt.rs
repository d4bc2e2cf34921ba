//! Prompt construction for rumor retelling and truth scoring

use crate::strategy::MutationKind;

/// Coarse label for how far a retelling may drift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistortionLabel {
    /// Below 0.2
    Minimal,
    /// 0.2 up to 0.4
    Moderate,
    /// 0.4 up to 0.7
    Significant,
    /// 0.7 and above
    Extreme,
}

impl DistortionLabel {
    /// Discretize a distortion level in [0, 1]
    pub fn from_level(level: f64) -> Self {
        if level < 0.2 {
            DistortionLabel::Minimal
        } else if level < 0.4 {
            DistortionLabel::Moderate
        } else if level < 0.7 {
            DistortionLabel::Significant
        } else {
            DistortionLabel::Extreme
        }
    }

    /// Label as used in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            DistortionLabel::Minimal => "minimal",
            DistortionLabel::Moderate => "moderate",
            DistortionLabel::Significant => "significant",
            DistortionLabel::Extreme => "extreme",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            DistortionLabel::Minimal => "Keep the meaning intact; change a word or two at most.",
            DistortionLabel::Moderate => "Keep the core facts but let small details shift or grow.",
            DistortionLabel::Significant => {
                "Exaggerate freely and let some details become wrong, but keep it recognisable."
            }
            DistortionLabel::Extreme => {
                "Wildly exaggerate and misremember; only the gist of the original survives."
            }
        }
    }
}

/// Builds the prompt asking the generator to retell a rumor
pub struct MutationPromptBuilder<'a> {
    original_event: &'a str,
    current_text: &'a str,
    traits: &'a [String],
    max_traits: usize,
    distortion_level: f64,
    direction: Option<&'a str>,
    mutation_kind: Option<MutationKind>,
}

impl<'a> MutationPromptBuilder<'a> {
    /// Create a builder for retelling `current_text`
    pub fn new(original_event: &'a str, current_text: &'a str, distortion_level: f64) -> Self {
        Self {
            original_event,
            current_text,
            traits: &[],
            max_traits: usize::MAX,
            distortion_level,
            direction: None,
            mutation_kind: None,
        }
    }

    /// Describe the teller (at most `max` traits are used)
    pub fn with_traits(mut self, traits: &'a [String], max: usize) -> Self {
        self.traits = traits;
        self.max_traits = max;
        self
    }

    /// Steer the retelling in a direction (e.g. "more sinister")
    pub fn with_direction(mut self, direction: Option<&'a str>) -> Self {
        self.direction = direction.filter(|d| !d.trim().is_empty());
        self
    }

    /// Ask for a particular kind of embellishment
    pub fn with_mutation_kind(mut self, kind: Option<MutationKind>) -> Self {
        self.mutation_kind = kind;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let label = DistortionLabel::from_level(self.distortion_level);
        let mut prompt = String::new();

        prompt.push_str(RETELL_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Original event: {}\n", self.original_event));
        prompt.push_str(&format!("Current version: {}\n", self.current_text));

        let traits: Vec<&str> = self
            .traits
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .take(self.max_traits)
            .collect();
        if traits.is_empty() {
            prompt.push_str("Teller: an ordinary person\n");
        } else {
            prompt.push_str(&format!("Teller traits: {}\n", traits.join(", ")));
        }

        prompt.push_str(&format!(
            "Distortion level: {} ({:.2})\n",
            label.as_str(),
            self.distortion_level
        ));
        prompt.push_str(label.guidance());
        prompt.push('\n');

        if let Some(direction) = self.direction {
            prompt.push_str(&format!("Push the story in this direction: {}\n", direction.trim()));
        }

        if let Some(kind) = self.mutation_kind {
            prompt.push_str(&format!("Embellishment: {}\n", kind.guidance()));
        }

        prompt.push('\n');
        prompt.push_str(OUTPUT_REMINDER);
        prompt
    }
}

/// Builds the prompt asking the generator to score truthfulness
pub fn truth_prompt(original_event: &str, retold: &str) -> String {
    format!(
        "{}\n\nOriginal event: {}\nRumor as told: {}\n\n{}",
        TRUTH_INSTRUCTIONS, original_event, retold, TRUTH_REMINDER
    )
}

const RETELL_INSTRUCTIONS: &str = "You are retelling a rumor the way a person would pass it on \
in conversation. Stay in character as the teller and keep the retelling short.";

const OUTPUT_REMINDER: &str =
    "Respond with only the retold rumor in one or two sentences. No labels, no explanation.";

const TRUTH_INSTRUCTIONS: &str = "Compare a rumor with the event it is based on and rate how \
truthful the rumor still is, from 0.0 (entirely false) to 1.0 (entirely accurate).";

const TRUTH_REMINDER: &str = "Respond with only the number.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        assert_eq!(DistortionLabel::from_level(0.0), DistortionLabel::Minimal);
        assert_eq!(DistortionLabel::from_level(0.19), DistortionLabel::Minimal);
        assert_eq!(DistortionLabel::from_level(0.2), DistortionLabel::Moderate);
        assert_eq!(DistortionLabel::from_level(0.4), DistortionLabel::Significant);
        assert_eq!(DistortionLabel::from_level(0.7), DistortionLabel::Extreme);
        assert_eq!(DistortionLabel::from_level(1.0), DistortionLabel::Extreme);
    }

    #[test]
    fn test_prompt_contents() {
        let traits = vec!["gossipy".to_string(), " ".to_string(), "paranoid".to_string()];
        let prompt = MutationPromptBuilder::new("The king has a cold", "The king is ill", 0.5)
            .with_traits(&traits, 8)
            .with_direction(Some("more sinister"))
            .build();

        assert!(prompt.contains("Original event: The king has a cold"));
        assert!(prompt.contains("Current version: The king is ill"));
        assert!(prompt.contains("Teller traits: gossipy, paranoid"));
        assert!(prompt.contains("Distortion level: significant (0.50)"));
        assert!(prompt.contains("more sinister"));
    }

    #[test]
    fn test_prompt_trait_cap_and_defaults() {
        let traits: Vec<String> = (0..5).map(|i| format!("trait{}", i)).collect();
        let prompt = MutationPromptBuilder::new("a", "b", 0.1)
            .with_traits(&traits, 2)
            .with_direction(Some("  "))
            .build();
        assert!(prompt.contains("Teller traits: trait0, trait1\n"));
        assert!(!prompt.contains("direction"));

        let bare = MutationPromptBuilder::new("a", "b", 0.9).build();
        assert!(bare.contains("Teller: an ordinary person"));
        assert!(bare.contains("extreme"));
        assert!(!bare.contains("Embellishment"));
    }

    #[test]
    fn test_prompt_mutation_kind() {
        let prompt = MutationPromptBuilder::new("a", "b", 0.5)
            .with_mutation_kind(Some(MutationKind::AuthorityTransfer))
            .build();
        assert!(prompt.contains("Embellishment: Credit the story to officials"));
    }

    #[test]
    fn test_truth_prompt() {
        let prompt = truth_prompt("The king has a cold", "The king is dead");
        assert!(prompt.contains("Rumor as told: The king is dead"));
        assert!(prompt.ends_with("Respond with only the number."));
    }
}
