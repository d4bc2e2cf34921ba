//! Severity - coarse impact rating of a rumor

/// How much a rumor matters
///
/// Severity modulates decay rate, mutation rate, reach and the conviction a
/// listener needs before passing the rumor on. Variants are declared from
/// least to most severe so the derived ordering is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RumorSeverity {
    /// Idle gossip
    Trivial,

    /// Interesting but not consequential
    Minor,

    /// Could affect a reputation
    Moderate,

    /// Could affect relationships or alliances
    Major,

    /// Could trigger major events
    Critical,
}

impl RumorSeverity {
    /// All severities, least severe first
    pub const ALL: [RumorSeverity; 5] = [
        RumorSeverity::Trivial,
        RumorSeverity::Minor,
        RumorSeverity::Moderate,
        RumorSeverity::Major,
        RumorSeverity::Critical,
    ];

    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RumorSeverity::Trivial => "trivial",
            RumorSeverity::Minor => "minor",
            RumorSeverity::Moderate => "moderate",
            RumorSeverity::Major => "major",
            RumorSeverity::Critical => "critical",
        }
    }

    /// Parse a severity (case-insensitive, surrounding whitespace ignored)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trivial" => Some(RumorSeverity::Trivial),
            "minor" => Some(RumorSeverity::Minor),
            "moderate" => Some(RumorSeverity::Moderate),
            "major" => Some(RumorSeverity::Major),
            "critical" => Some(RumorSeverity::Critical),
            _ => None,
        }
    }

    /// Parse a severity, falling back to `Minor` for unknown input
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Multiplier applied to believability decay and to mutation chance
    ///
    /// Severe rumors stick in memory and resist distortion.
    pub fn decay_factor(&self) -> f64 {
        match self {
            RumorSeverity::Trivial => 1.5,
            RumorSeverity::Minor => 1.2,
            RumorSeverity::Moderate => 1.0,
            RumorSeverity::Major => 0.8,
            RumorSeverity::Critical => 0.6,
        }
    }

    /// Multiplier applied to spread radius (severe rumors travel farther)
    pub fn reach_factor(&self) -> f64 {
        match self {
            RumorSeverity::Trivial => 0.7,
            RumorSeverity::Minor => 0.85,
            RumorSeverity::Moderate => 1.0,
            RumorSeverity::Major => 1.25,
            RumorSeverity::Critical => 1.5,
        }
    }

    /// Multiplier applied to the believability threshold for passing a rumor on
    pub fn conviction_factor(&self) -> f64 {
        match self {
            RumorSeverity::Trivial => 0.8,
            RumorSeverity::Minor => 0.9,
            RumorSeverity::Moderate => 1.0,
            RumorSeverity::Major => 1.1,
            RumorSeverity::Critical => 1.2,
        }
    }
}

impl Default for RumorSeverity {
    fn default() -> Self {
        RumorSeverity::Minor
    }
}

impl std::fmt::Display for RumorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RumorSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid severity: {}", s))
    }
}
