//! Numeric and qualitative listing attributes (spec §3, §4.4).

use serde::{Deserialize, Serialize};

/// A single extracted attribute value, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeValue {
    Number { value: f64 },
    /// At least one endpoint is present.
    Range { min: Option<f64>, max: Option<f64> },
    Enum { value: String },
    /// Qualitative hint, e.g. priceIndicator ∈ {cheap, expensive}.
    Hint { value: String },
}

impl AttributeValue {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            None
        } else {
            Some(AttributeValue::Range { min, max })
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            AttributeValue::Range { min, max } => Some((*min, *max)),
            _ => None,
        }
    }
}

/// Well-known attribute slugs extracted by `AttributeExtractor` (spec
/// §4.4). Kept as `&'static str` constants rather than an enum because
/// `FilterBuilder` treats the attribute map generically by slug.
pub mod slugs {
    pub const PRICE: &str = "price";
    pub const AREA: &str = "area";
    pub const ROOMS: &str = "rooms";
    pub const YEAR: &str = "year";
    pub const MILEAGE: &str = "mileage";
    pub const CONDITION: &str = "condition";
    pub const PRICE_HINT: &str = "price_hint";
}
