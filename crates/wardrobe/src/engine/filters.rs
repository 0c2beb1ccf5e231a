use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use crate::catalog::{ClothingItem, Formality, Season};

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.trim().is_empty())
}

fn is_all_sentinel(raw: &str) -> bool {
    let value = raw.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

/// Formality restriction for an analysis.
///
/// `Any` is the "all" sentinel: every level is admitted and an outfit may mix
/// levels. `Within` admits only the listed levels and every outfit must be
/// uniform in formality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormalityFilter {
    #[default]
    Any,
    Within(BTreeSet<Formality>),
}

impl FormalityFilter {
    pub fn only(level: Formality) -> Self {
        Self::Within(BTreeSet::from([level]))
    }

    pub fn parse(raw: Option<&str>) -> Result<Self, EngineError> {
        match raw {
            None => Ok(Self::Any),
            Some(value) if is_all_sentinel(value) => Ok(Self::Any),
            Some(value) => Ok(Self::only(value.parse::<Formality>()?)),
        }
    }

    pub fn admits(&self, level: Formality) -> bool {
        match self {
            Self::Any => true,
            Self::Within(levels) => levels.contains(&level),
        }
    }

    pub fn requires_uniform(&self) -> bool {
        matches!(self, Self::Within(_))
    }

    pub fn levels(&self) -> Vec<Formality> {
        match self {
            Self::Any => Formality::ALL.to_vec(),
            Self::Within(levels) => levels.iter().copied().collect(),
        }
    }
}

/// Season restriction. Items tagged `all` pass every season filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SeasonFilter {
    #[default]
    Any,
    Within(BTreeSet<Season>),
}

impl SeasonFilter {
    pub fn only(season: Season) -> Self {
        Self::Within(BTreeSet::from([season]))
    }

    pub fn parse(raw: Option<&str>) -> Result<Self, EngineError> {
        match raw {
            None => Ok(Self::Any),
            Some(value) if is_all_sentinel(value) => Ok(Self::Any),
            Some(value) => Ok(Self::only(value.parse::<Season>()?)),
        }
    }

    pub fn admits(&self, season: Season) -> bool {
        match self {
            Self::Any => true,
            Self::Within(seasons) => season == Season::All || seasons.contains(&season),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutfitFilters {
    pub formality: FormalityFilter,
    pub season: SeasonFilter,
}

impl OutfitFilters {
    pub fn new(formality: FormalityFilter, season: SeasonFilter) -> Self {
        Self { formality, season }
    }

    /// Validates raw filter strings at the boundary; unknown values are rejected.
    pub fn parse(formality: Option<&str>, season: Option<&str>) -> Result<Self, EngineError> {
        Ok(Self {
            formality: FormalityFilter::parse(formality)?,
            season: SeasonFilter::parse(season)?,
        })
    }

    pub fn admits(&self, item: &ClothingItem) -> bool {
        self.formality.admits(item.formality) && self.season.admits(item.season)
    }
}

macro_rules! preference_enum {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(EngineError::InvalidFilter {
                        field: $field,
                        value: raw.to_string(),
                    }),
                }
            }
        }
    };
}

preference_enum!(Lifestyle, "lifestyle", {
    Professional => "professional",
    Casual => "casual",
    Mixed => "mixed",
    Creative => "creative",
});

preference_enum!(Climate, "climate", {
    Tropical => "tropical",
    Temperate => "temperate",
    Cold => "cold",
    Varied => "varied",
});

preference_enum!(Budget, "budget", {
    Budget => "budget",
    Medium => "medium",
    Premium => "premium",
});

impl Lifestyle {
    pub fn formality_filter(self) -> FormalityFilter {
        match self {
            Lifestyle::Professional => {
                FormalityFilter::Within(BTreeSet::from([Formality::Business, Formality::Formal]))
            }
            Lifestyle::Casual => {
                FormalityFilter::Within(BTreeSet::from([Formality::Casual, Formality::Athletic]))
            }
            Lifestyle::Mixed => {
                FormalityFilter::Within(BTreeSet::from([Formality::Casual, Formality::Business]))
            }
            Lifestyle::Creative => FormalityFilter::Any,
        }
    }
}

impl Climate {
    pub fn season_filter(self) -> SeasonFilter {
        match self {
            Climate::Tropical => {
                SeasonFilter::Within(BTreeSet::from([Season::Spring, Season::Summer]))
            }
            Climate::Cold => SeasonFilter::Within(BTreeSet::from([Season::Fall, Season::Winter])),
            Climate::Temperate | Climate::Varied => SeasonFilter::Any,
        }
    }
}

/// Capsule preferences. Lifestyle and climate narrow the candidate pool;
/// budget only shapes the advice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsulePreferences {
    pub lifestyle: Lifestyle,
    pub climate: Climate,
    pub budget: Budget,
}

impl Default for CapsulePreferences {
    fn default() -> Self {
        Self {
            lifestyle: Lifestyle::Mixed,
            climate: Climate::Temperate,
            budget: Budget::Medium,
        }
    }
}

impl CapsulePreferences {
    pub fn parse(
        lifestyle: Option<&str>,
        climate: Option<&str>,
        budget: Option<&str>,
    ) -> Result<Self, EngineError> {
        let defaults = Self::default();

        Ok(Self {
            lifestyle: match non_blank(lifestyle) {
                Some(value) => value.parse()?,
                None => defaults.lifestyle,
            },
            climate: match non_blank(climate) {
                Some(value) => value.parse()?,
                None => defaults.climate,
            },
            budget: match non_blank(budget) {
                Some(value) => value.parse()?,
                None => defaults.budget,
            },
        })
    }

    pub fn filters(&self) -> OutfitFilters {
        OutfitFilters::new(
            self.lifestyle.formality_filter(),
            self.climate.season_filter(),
        )
    }
}
