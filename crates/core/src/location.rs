//! Location: a tagged variant over City / Neighborhood (spec §3, §9
//! "Polymorphism over locations").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub province_name_ar: String,
    pub province_name_en: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub active: bool,
}

impl City {
    pub fn localized_name(&self, language: crate::Language) -> &str {
        match language {
            crate::Language::Ar => &self.name_ar,
            crate::Language::En => &self.name_en,
        }
    }

    pub fn localized_province(&self, language: crate::Language) -> &str {
        match language {
            crate::Language::Ar => &self.province_name_ar,
            crate::Language::En => &self.province_name_en,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub city_id: i64,
}

impl Neighborhood {
    pub fn localized_name(&self, language: crate::Language) -> &str {
        match language {
            crate::Language::Ar => &self.name_ar,
            crate::Language::En => &self.name_en,
        }
    }
}

/// Discriminated union of the two location variants. The orchestrator
/// dispatches on the tag; neither variant owns the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    City(City),
    Neighborhood(Neighborhood),
}

impl Location {
    /// Invariant (a): a neighborhood's parent city id must be resolvable.
    /// Resolution happens through a repository lookup, not stored here.
    pub fn city_id(&self) -> i64 {
        match self {
            Location::City(c) => c.id,
            Location::Neighborhood(n) => n.city_id,
        }
    }
}

/// A resolved location reference as carried on an `Intent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationKind {
    City,
    Neighborhood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub id: i64,
    pub kind: LocationKind,
    pub name: String,
    pub confidence: f32,
}
