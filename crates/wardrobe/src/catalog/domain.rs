use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the catalog. Ordering is lexical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Raised when a boundary string does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {field} '{value}'")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Garment slot an item can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Dress,
    Jacket,
    Shoes,
    Accessory,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Top,
        Category::Bottom,
        Category::Dress,
        Category::Jacket,
        Category::Shoes,
        Category::Accessory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Dress => "dress",
            Category::Jacket => "jacket",
            Category::Shoes => "shoes",
            Category::Accessory => "accessory",
        }
    }

    /// Label used in generated prose ("3 tops").
    pub fn plural(self) -> &'static str {
        match self {
            Category::Top => "tops",
            Category::Bottom => "bottoms",
            Category::Dress => "dresses",
            Category::Jacket => "jackets",
            Category::Shoes => "shoes",
            Category::Accessory => "accessories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.label() == value)
            .ok_or_else(|| UnknownValue::new("category", raw))
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    #[default]
    Casual,
    Business,
    Formal,
    Athletic,
}

impl Formality {
    pub const ALL: [Formality; 4] = [
        Formality::Casual,
        Formality::Business,
        Formality::Formal,
        Formality::Athletic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Formality::Casual => "casual",
            Formality::Business => "business",
            Formality::Formal => "formal",
            Formality::Athletic => "athletic",
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Formality {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        Formality::ALL
            .into_iter()
            .find(|level| level.label() == value)
            .ok_or_else(|| UnknownValue::new("formality", raw))
    }
}

/// Season tag on an item. `All` marks a piece worn year-round.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    #[default]
    All,
}

impl Season {
    pub const ALL: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Fall,
        Season::Winter,
        Season::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
            Season::All => "all",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        if value == "autumn" {
            return Ok(Season::Fall);
        }
        Season::ALL
            .into_iter()
            .find(|season| season.label() == value)
            .ok_or_else(|| UnknownValue::new("season", raw))
    }
}

/// Catalog record as read by the engine. The engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub color: String,
    pub formality: Formality,
    pub season: Season,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create payload accepted by the catalog before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClothingItem {
    pub name: String,
    pub category: Category,
    pub color: String,
    #[serde(default)]
    pub formality: Formality,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewClothingItem {
    /// Returns the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.color.trim().is_empty() {
            Some("color")
        } else {
            None
        }
    }

    pub fn into_item(self, id: ItemId, created_at: Option<DateTime<Utc>>) -> ClothingItem {
        ClothingItem {
            id,
            name: self.name.trim().to_string(),
            category: self.category,
            color: self.color.trim().to_string(),
            formality: self.formality,
            season: self.season,
            notes: self.notes.filter(|note| !note.trim().is_empty()),
            created_at,
        }
    }
}
