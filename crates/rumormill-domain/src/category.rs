//! Category tags for rumors

/// Topic a rumor is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RumorCategory {
    /// Rulers, courts, factions
    Political,
    /// One person's private affairs
    Personal,
    /// Community life
    Social,
    /// Armies and wars
    Military,
    /// Trade, prices, fortunes
    Economic,
    /// Temples, gods, omens
    Religious,
    /// Events long past
    Historical,
    /// Idle talk
    Gossip,
    /// Anything else
    Other,
}

impl RumorCategory {
    /// All categories in declaration order
    pub const ALL: [RumorCategory; 9] = [
        RumorCategory::Political,
        RumorCategory::Personal,
        RumorCategory::Social,
        RumorCategory::Military,
        RumorCategory::Economic,
        RumorCategory::Religious,
        RumorCategory::Historical,
        RumorCategory::Gossip,
        RumorCategory::Other,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RumorCategory::Political => "political",
            RumorCategory::Personal => "personal",
            RumorCategory::Social => "social",
            RumorCategory::Military => "military",
            RumorCategory::Economic => "economic",
            RumorCategory::Religious => "religious",
            RumorCategory::Historical => "historical",
            RumorCategory::Gossip => "gossip",
            RumorCategory::Other => "other",
        }
    }

    /// Parse a category (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lowered)
    }

    /// Parse a category, falling back to `Other` for unknown input
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Normalize a list of raw category names
    ///
    /// Unknown names become `Other`, duplicates collapse (first occurrence
    /// wins) and an empty input yields `[Other]`.
    pub fn normalize<I, S>(raw: I) -> Vec<RumorCategory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for name in raw {
            let category = Self::parse_or_default(name.as_ref());
            if !out.contains(&category) {
                out.push(category);
            }
        }
        if out.is_empty() {
            out.push(RumorCategory::Other);
        }
        out
    }
}

impl Default for RumorCategory {
    fn default() -> Self {
        RumorCategory::Other
    }
}

impl std::fmt::Display for RumorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RumorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known() {
        assert_eq!(RumorCategory::parse("Political"), Some(RumorCategory::Political));
        assert_eq!(RumorCategory::parse("gossip"), Some(RumorCategory::Gossip));
        assert_eq!(RumorCategory::parse("dragons"), None);
    }

    #[test]
    fn test_normalize_defaults_and_dedups() {
        assert_eq!(RumorCategory::normalize(Vec::<String>::new()), vec![RumorCategory::Other]);
        assert_eq!(
            RumorCategory::normalize(["military", "MILITARY", "dragons", "other"]),
            vec![RumorCategory::Military, RumorCategory::Other]
        );
    }
}
