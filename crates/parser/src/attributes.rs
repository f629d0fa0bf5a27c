//! Regex-based attribute extraction (spec §4.4), grounded in the
//! compiled-slot-pattern mechanism from intent/slot detection: patterns
//! are compiled once at construction and tried in a fixed order per
//! attribute, ranges before single values.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use souq_core::attribute::slugs;
use souq_core::AttributeValue;

/// A compiled pattern plus the multiplier applied to any captured number
/// (e.g. 1_000_000.0 for a "million" marker).
struct CompiledPattern {
    regex: Regex,
    multiplier: f64,
}

fn strip_commas(s: &str) -> String {
    s.chars().filter(|c| *c != ',').collect()
}

fn parse_f64(s: &str) -> Option<f64> {
    strip_commas(s).parse().ok()
}

static PRICE_RANGE_PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    vec![
        CompiledPattern {
            regex: Regex::new(r"(?i)from\s+(?:sar\s*)?([\d,]+(?:\.\d+)?)\s*(million|m)?\s*to\s+(?:sar\s*)?([\d,]+(?:\.\d+)?)\s*(million|m)?").unwrap(),
            multiplier: 1.0,
        },
        CompiledPattern {
            regex: Regex::new(r"(?i)between\s+(?:sar\s*)?([\d,]+(?:\.\d+)?)\s*(million|m)?\s*and\s+(?:sar\s*)?([\d,]+(?:\.\d+)?)\s*(million|m)?").unwrap(),
            multiplier: 1.0,
        },
        CompiledPattern {
            regex: Regex::new(r"(?i)من\s+([\d,]+(?:\.\d+)?)\s*(مليون)?\s*(?:الى|إلى)\s+([\d,]+(?:\.\d+)?)\s*(مليون)?").unwrap(),
            multiplier: 1.0,
        },
        CompiledPattern {
            regex: Regex::new(r"([\d,]+(?:\.\d+)?)\s*(million|مليون|m)?\s*-\s*([\d,]+(?:\.\d+)?)\s*(million|مليون|m)?\s*(?:sar|ريال)?").unwrap(),
            multiplier: 1.0,
        },
    ]
});

static PRICE_SINGLE_PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    vec![
        CompiledPattern {
            regex: Regex::new(r"(?i)(?:sar|ريال)\s*([\d,]+(?:\.\d+)?)\s*(million|مليون)?").unwrap(),
            multiplier: 1.0,
        },
        CompiledPattern {
            regex: Regex::new(r"(?i)(?:price|سعر|بسعر)\s*:?\s*([\d,]+(?:\.\d+)?)\s*(million|مليون)?").unwrap(),
            multiplier: 1.0,
        },
        CompiledPattern {
            regex: Regex::new(r"(?i)([\d,]+(?:\.\d+)?)\s*(million|مليون)\s*(?:sar|ريال)?").unwrap(),
            multiplier: 1_000_000.0,
        },
    ]
});

static AREA_RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+(?:\.\d+)?)\s*(?:sqm|m2|م2|متر)?\s*-\s*([\d,]+(?:\.\d+)?)\s*(?:sqm|m2|متر مربع|م2|متر)").unwrap()
});

static AREA_SINGLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+(?:\.\d+)?)\s*(?:sqm|sq\s*m|m2|متر مربع|متر|dunum|دونم|hectare|هكتار)").unwrap()
});

static ROOMS_NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:rooms?|bedrooms?|غرف|غرفة)").unwrap()
});

static ROOMS_LEXICON: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\bone\s+room\b|غرفة واحدة").unwrap(), 1.0),
        (Regex::new(r"(?i)\btwo\s+rooms\b|غرفتين").unwrap(), 2.0),
        (Regex::new(r"(?i)\bthree\s+rooms\b|ثلاث غرف").unwrap(), 3.0),
        (Regex::new(r"(?i)\bfour\s+rooms\b|اربع غرف|أربع غرف").unwrap(), 4.0),
        (Regex::new(r"(?i)\bfive\s+rooms\b|خمس غرف").unwrap(), 5.0),
    ]
});

static YEAR_WITH_MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:model|year|موديل|سنة)\s*:?\s*(\d{4})").unwrap()
});

static YEAR_STANDALONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

static MILEAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+)\s*(?:km|kilometers?|كم|كيلومتر)").unwrap()
});

static CONDITION_NEW_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bnew\b|جديد|جديدة").unwrap());
static CONDITION_USED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bused\b|مستعمل|مستعملة").unwrap());

static PRICE_HINT_CHEAP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcheap\b|رخيص|رخيصة").unwrap());
static PRICE_HINT_EXPENSIVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bexpensive\b|غالي|غالية").unwrap());

fn try_range(patterns: &[CompiledPattern], text: &str) -> Option<AttributeValue> {
    for pattern in patterns {
        if let Some(caps) = pattern.regex.captures(text) {
            let min = caps.get(1).and_then(|m| parse_f64(m.as_str()));
            let max = caps.get(3).and_then(|m| parse_f64(m.as_str()));
            let has_million_marker = caps.get(2).is_some() || caps.get(4).is_some();
            let multiplier = if has_million_marker { 1_000_000.0 } else { pattern.multiplier };
            let min = min.map(|v| v * multiplier);
            let max = max.map(|v| v * multiplier);
            if let Some(value) = AttributeValue::range(min, max) {
                return Some(value);
            }
        }
    }
    None
}

fn try_single(patterns: &[CompiledPattern], text: &str) -> Option<AttributeValue> {
    for pattern in patterns {
        if let Some(caps) = pattern.regex.captures(text) {
            let raw = caps.get(1)?.as_str();
            let value = parse_f64(raw)?;
            let has_marker = caps.get(2).is_some();
            let multiplier = if has_marker { 1_000_000.0 } else { pattern.multiplier };
            return Some(AttributeValue::Number {
                value: value * multiplier,
            });
        }
    }
    None
}

/// Pure regex extraction over normalized text (spec §4.4). Stateless;
/// patterns are compiled once at first use via `Lazy` statics.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeExtractor;

impl AttributeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every attribute this module knows about from a single
    /// pass of regex matching. Range wins over single value when both
    /// would match the same attribute (spec §4.4 "if both ... the range
    /// wins").
    pub fn extract(&self, text: &str) -> HashMap<String, AttributeValue> {
        let mut out = HashMap::new();

        if let Some(price) = try_range(&PRICE_RANGE_PATTERNS, text).or_else(|| try_single(&PRICE_SINGLE_PATTERNS, text)) {
            out.insert(slugs::PRICE.to_string(), price);
        }

        if let Some(caps) = AREA_RANGE_PATTERN.captures(text) {
            let min = caps.get(1).and_then(|m| parse_f64(m.as_str()));
            let max = caps.get(2).and_then(|m| parse_f64(m.as_str()));
            if let Some(value) = AttributeValue::range(min, max) {
                out.insert(slugs::AREA.to_string(), value);
            }
        } else if let Some(caps) = AREA_SINGLE_PATTERN.captures(text) {
            if let Some(value) = caps.get(1).and_then(|m| parse_f64(m.as_str())) {
                out.insert(slugs::AREA.to_string(), AttributeValue::Number { value });
            }
        }

        if let Some(caps) = ROOMS_NUMERIC_PATTERN.captures(text) {
            if let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                out.insert(slugs::ROOMS.to_string(), AttributeValue::Number { value });
            }
        } else {
            for (pattern, value) in ROOMS_LEXICON.iter() {
                if pattern.is_match(text) {
                    out.insert(slugs::ROOMS.to_string(), AttributeValue::Number { value: *value });
                    break;
                }
            }
        }

        if let Some(caps) = YEAR_WITH_MARKER_PATTERN.captures(text) {
            if let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                out.insert(slugs::YEAR.to_string(), AttributeValue::Number { value });
            }
        } else if let Some(m) = YEAR_STANDALONE_PATTERN.find(text) {
            if let Ok(value) = m.as_str().parse::<f64>() {
                out.insert(slugs::YEAR.to_string(), AttributeValue::Number { value });
            }
        }

        if let Some(caps) = MILEAGE_PATTERN.captures(text) {
            if let Some(value) = caps.get(1).and_then(|m| parse_f64(m.as_str())) {
                out.insert(slugs::MILEAGE.to_string(), AttributeValue::Number { value });
            }
        }

        if CONDITION_NEW_PATTERN.is_match(text) {
            out.insert(
                slugs::CONDITION.to_string(),
                AttributeValue::Enum { value: "new".to_string() },
            );
        } else if CONDITION_USED_PATTERN.is_match(text) {
            out.insert(
                slugs::CONDITION.to_string(),
                AttributeValue::Enum { value: "used".to_string() },
            );
        }

        if PRICE_HINT_CHEAP_PATTERN.is_match(text) {
            out.insert(
                slugs::PRICE_HINT.to_string(),
                AttributeValue::Hint { value: "cheap".to_string() },
            );
        } else if PRICE_HINT_EXPENSIVE_PATTERN.is_match(text) {
            out.insert(
                slugs::PRICE_HINT.to_string(),
                AttributeValue::Hint { value: "expensive".to_string() },
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_price_range_over_single_value() {
        let attrs = AttributeExtractor::new().extract("villa from 500000 to 800000 sar");
        let price = attrs.get(slugs::PRICE).unwrap();
        assert_eq!(price.as_range(), Some((Some(500000.0), Some(800000.0))));
    }

    #[test]
    fn million_marker_multiplies_single_price() {
        let attrs = AttributeExtractor::new().extract("villa 1.5 million sar");
        let price = attrs.get(slugs::PRICE).unwrap();
        assert_eq!(price.as_number(), Some(1_500_000.0));
    }

    #[test]
    fn strips_commas_from_numerics() {
        let attrs = AttributeExtractor::new().extract("price: 1,250,000");
        assert_eq!(attrs.get(slugs::PRICE).unwrap().as_number(), Some(1_250_000.0));
    }

    #[test]
    fn rooms_lexicon_maps_words_to_counts() {
        let attrs = AttributeExtractor::new().extract("apartment with three rooms");
        assert_eq!(attrs.get(slugs::ROOMS).unwrap().as_number(), Some(3.0));
    }

    #[test]
    fn standalone_year_is_recognized() {
        let attrs = AttributeExtractor::new().extract("toyota camry 2019 for sale");
        assert_eq!(attrs.get(slugs::YEAR).unwrap().as_number(), Some(2019.0));
    }

    #[test]
    fn condition_and_price_hint_are_lexical() {
        let attrs = AttributeExtractor::new().extract("new car, cheap price");
        assert_eq!(attrs.get(slugs::CONDITION).unwrap().as_number(), None);
        assert!(matches!(attrs.get(slugs::CONDITION), Some(AttributeValue::Enum { value }) if value == "new"));
        assert!(matches!(attrs.get(slugs::PRICE_HINT), Some(AttributeValue::Hint { value }) if value == "cheap"));
    }
}
