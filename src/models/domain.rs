use serde::{Deserialize, Serialize};

/// Physical setting of an experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(alias = "home", alias = "HOME")]
    Home,
    #[serde(alias = "out", alias = "OUT")]
    Out,
    #[serde(alias = "virtual", alias = "VIRTUAL", alias = "Online", alias = "online")]
    Virtual,
}

impl Mode {
    /// Parse a free-form catalog label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "home" | "at home" => Some(Mode::Home),
            "out" | "going out" => Some(Mode::Out),
            "virtual" | "online" => Some(Mode::Virtual),
            _ => None,
        }
    }
}

/// How hands-on the guests are during an experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvolvementStyle {
    #[serde(alias = "learn")]
    LearnHandsOn,
    #[serde(alias = "watch")]
    WatchAndBeServed,
    #[serde(alias = "collaborate")]
    Collaborative,
    #[default]
    #[serde(alias = "anything")]
    Anything,
}

impl InvolvementStyle {
    /// Parse a free-form catalog label; unknown labels yield `None`
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match compact.as_str() {
            "learnhandson" | "learn" | "handson" => Some(InvolvementStyle::LearnHandsOn),
            "watchandbeserved" | "watch" => Some(InvolvementStyle::WatchAndBeServed),
            "collaborative" | "collaborate" => Some(InvolvementStyle::Collaborative),
            "anything" | "any" => Some(InvolvementStyle::Anything),
            _ => None,
        }
    }
}

/// Inclusive integer range; `max == None` is unbounded above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusiveRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl InclusiveRange {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    /// Distance from `value` to the nearest bound, zero when inside
    #[inline]
    pub fn distance_to(&self, value: u32) -> u32 {
        if value < self.min {
            return self.min - value;
        }
        match self.max {
            Some(max) if value > max => value - max,
            _ => 0,
        }
    }

    /// Midpoint of the range. An unbounded range is represented by its lower bound.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        match self.max {
            Some(max) => (self.min as f64 + max as f64) / 2.0,
            None => self.min as f64,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

/// A bookable experience in the catalog, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mode: Mode,
    #[serde(default, alias = "format")]
    pub formats: Vec<String>,
    #[serde(default)]
    pub cuisine: String,
    #[serde(rename = "minParty", default)]
    pub min_party: u32,
    #[serde(rename = "maxParty", default, skip_serializing_if = "Option::is_none")]
    pub max_party: Option<u32>,
    #[serde(rename = "minPricePP", alias = "minBudgetPP", default)]
    pub min_price_pp: u32,
    #[serde(
        rename = "maxPricePP",
        alias = "maxBudgetPP",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_price_pp: Option<u32>,
    #[serde(rename = "groupSuitability", default)]
    pub group_suitability: Vec<String>,
    #[serde(rename = "vibeTags", alias = "vibes", default)]
    pub vibe_tags: Vec<String>,
    #[serde(rename = "toneTags", alias = "tone", default)]
    pub tone_tags: Vec<String>,
    #[serde(rename = "flavourTags", alias = "flavour", default)]
    pub flavour_tags: Vec<String>,
    #[serde(rename = "minAdventure", default)]
    pub min_adventure: u8,
    #[serde(rename = "maxAdventure", default, skip_serializing_if = "Option::is_none")]
    pub max_adventure: Option<u8>,
    #[serde(rename = "involvementStyle", alias = "involvement", default)]
    pub involvement_style: InvolvementStyle,
    #[serde(rename = "hardExclusions", alias = "hardNos", default)]
    pub hard_exclusions: Vec<String>,
}

impl Experience {
    pub fn party_range(&self) -> InclusiveRange {
        InclusiveRange::new(self.min_party, self.max_party)
    }

    pub fn price_range(&self) -> InclusiveRange {
        InclusiveRange::new(self.min_price_pp, self.max_price_pp)
    }

    pub fn adventure_range(&self) -> InclusiveRange {
        InclusiveRange::new(self.min_adventure as u32, self.max_adventure.map(u32::from))
    }
}

/// A user's stated preferences for one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "partySize")]
    pub party_size: u32,
    /// Zero means the user did not state a budget
    #[serde(rename = "budgetPerPerson", default)]
    pub budget_per_person: u32,
    #[serde(default)]
    pub vibe: Vec<String>,
    #[serde(default)]
    pub tone: Vec<String>,
    #[serde(default)]
    pub flavour: Vec<String>,
    #[serde(rename = "adventureLevel", default, skip_serializing_if = "Option::is_none")]
    pub adventure_level: Option<u8>,
    #[serde(default)]
    pub involvement: InvolvementStyle,
    #[serde(rename = "hardNos", default)]
    pub hard_nos: Vec<String>,
}

impl PreferenceQuery {
    /// A query for `party_size` guests with every other preference unconstrained
    pub fn for_party(party_size: u32) -> Self {
        Self {
            mode: None,
            group: None,
            party_size,
            budget_per_person: 0,
            vibe: vec![],
            tone: vec![],
            flavour: vec![],
            adventure_level: None,
            involvement: InvolvementStyle::Anything,
            hard_nos: vec![],
        }
    }

    #[inline]
    pub fn has_budget(&self) -> bool {
        self.budget_per_person > 0
    }
}

/// Per-term contributions to an experience's score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub budget: f64,
    pub vibe: f64,
    pub tone: f64,
    pub flavour: f64,
    pub adventure: f64,
    pub involvement: f64,
    pub total: f64,
}

/// Scored experience returned from a ranking call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredExperience {
    #[serde(flatten)]
    pub experience: Experience,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub budget: f64,
    pub budget_near: f64,
    pub vibe: f64,
    pub tone: f64,
    pub flavour: f64,
    pub adventure: f64,
    pub adventure_penalty: f64,
    pub involvement: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            budget: 30.0,
            budget_near: 10.0,
            vibe: 20.0,
            tone: 8.0,
            flavour: 6.0,
            adventure: 12.0,
            adventure_penalty: 4.0,
            involvement: 10.0,
        }
    }
}

/// Whether an out-of-range budget removes a candidate or only lowers its score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPolicy {
    #[default]
    Hard,
    Advisory,
}

/// Shape of the budget and tag-overlap terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Distance-to-midpoint budget curve and normalized tag overlap
    #[default]
    Continuous,
    /// Exact/near budget buckets and per-tag counts
    Stepped,
}

/// Ranking options that are fixed per deployment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub top_n: usize,
    pub budget_policy: BudgetPolicy,
    pub scoring_mode: ScoringMode,
    /// Absolute distance (currency units) under which an out-of-range budget still earns near credit
    pub near_budget_threshold: u32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            top_n: 6,
            budget_policy: BudgetPolicy::Hard,
            scoring_mode: ScoringMode::Continuous,
            near_budget_threshold: 30,
        }
    }
}

/// A submitted quiz and the experiences the user picked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub quiz: serde_json::Value,
    #[serde(rename = "selectedIds")]
    pub selected_ids: Vec<String>,
    #[serde(rename = "budgetPP")]
    pub budget_pp: Option<u32>,
    pub group: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
