//! FilterBuilder: a pure function from `Intent` to a parameterized
//! predicate set (spec §4.7). Never interpolates user text into
//! predicate syntax — values only ever flow into `ListingPredicate`'s
//! typed fields, left to the repository layer to bind as positional
//! parameters.

use std::collections::HashMap;

use souq_core::{attribute::slugs, AttributeValue, Intent, ListingPredicate};

/// Caller-supplied overrides merged over the parsed intent's attributes
/// (spec §4.7 `build(Intent, extras)`), e.g. an explicit price ceiling
/// from a UI filter widget that should win over what the parser guessed.
pub type FilterExtras = HashMap<String, AttributeValue>;

/// Whether to honor `intent.category` at all — the confidence gate in
/// `RetrievalOrchestrator` (spec §4.9) decides this before calling
/// `build`, not `FilterBuilder` itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilderOptions {
    pub include_category: bool,
}

/// Builds a `ListingPredicate` from a parsed intent plus extras. Pure:
/// no I/O, deterministic, same inputs produce the same predicate.
pub fn build(intent: &Intent, extras: &FilterExtras, opts: FilterBuilderOptions) -> ListingPredicate {
    let mut predicate = ListingPredicate::default();

    if opts.include_category {
        if let Some(category) = &intent.category {
            predicate.category_id = Some(category.id);
        }
    }

    if let Some(location) = &intent.location {
        match location.kind {
            souq_core::LocationKind::City => predicate.city_id = Some(location.id),
            souq_core::LocationKind::Neighborhood => predicate.neighborhood_id = Some(location.id),
        }
    }

    // transaction_type_id is left unset here: resolving a slug to a
    // concrete row id needs a HotCache lookup, which `RetrievalOrchestrator`
    // performs after calling `build` (spec §4.9 step 3).

    let mut attributes = intent.attributes.clone();
    attributes.extend(extras.clone());

    for (slug, value) in &attributes {
        apply_attribute(&mut predicate, slug, value);
    }

    predicate
}

fn apply_attribute(predicate: &mut ListingPredicate, slug: &str, value: &AttributeValue) {
    match (slug, value) {
        (s, AttributeValue::Range { min, max }) if s == slugs::PRICE => {
            predicate.price_min = *min;
            predicate.price_max = *max;
        }
        (s, AttributeValue::Number { value }) if s == slugs::PRICE => {
            // Single numeric price is an existential match, not a band.
            predicate.price_min = Some(*value);
            predicate.price_max = Some(*value);
        }
        (s, AttributeValue::Range { min, max }) if s == slugs::AREA => {
            predicate.area_min = *min;
            predicate.area_max = *max;
        }
        (s, AttributeValue::Number { value }) if s == slugs::AREA => {
            // Single numeric area: a +/-10% band, not exact equality
            // (SPEC_FULL.md open-question resolution — recall matters
            // more than precision for unqualified sqm phrases).
            predicate.area_min = Some(value * 0.9);
            predicate.area_max = Some(value * 1.1);
        }
        (s, AttributeValue::Range { min, max }) => {
            predicate.extra_numeric.push((s.to_string(), *min, *max));
        }
        (s, AttributeValue::Number { value }) => {
            predicate.extra_numeric.push((s.to_string(), Some(value * 0.9), Some(value * 1.1)));
        }
        (s, AttributeValue::Enum { value }) => {
            predicate.extra_enum.push((s.to_string(), value.to_lowercase()));
        }
        (s, AttributeValue::Hint { value }) => {
            predicate.extra_enum.push((s.to_string(), value.to_lowercase()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souq_core::{CategoryMatch, Language, LocationKind, LocationMatch, ParseMethod, Tier, Tokens};

    fn base_intent() -> Intent {
        Intent {
            original: "apartment in damascus".into(),
            normalized: "apartment in damascus".into(),
            language: Language::En,
            category: Some(CategoryMatch {
                id: 42,
                slug: "apartments".into(),
                name: "Apartments".into(),
                level: 2,
                confidence: 0.9,
            }),
            location: Some(LocationMatch {
                id: 7,
                kind: LocationKind::City,
                name: "Damascus".into(),
                confidence: 0.9,
            }),
            transaction_type: None,
            attributes: HashMap::new(),
            keywords: Tokens::default(),
            confidence: 0.9,
            tier: Tier::DbOnly,
            method: ParseMethod::DbMatch,
            llm: None,
        }
    }

    #[test]
    fn single_area_value_becomes_a_band() {
        let mut intent = base_intent();
        intent.attributes.insert(slugs::AREA.to_string(), AttributeValue::Number { value: 100.0 });
        let predicate = build(&intent, &FilterExtras::new(), FilterBuilderOptions { include_category: true });
        assert_eq!(predicate.area_min, Some(90.0));
        assert_eq!(predicate.area_max, Some(110.0));
    }

    #[test]
    fn category_dropped_when_gate_excludes_it() {
        let intent = base_intent();
        let predicate = build(&intent, &FilterExtras::new(), FilterBuilderOptions { include_category: false });
        assert_eq!(predicate.category_id, None);
        assert_eq!(predicate.city_id, Some(7));
    }

    #[test]
    fn extras_add_to_attributes() {
        let intent = base_intent();
        let mut extras = FilterExtras::new();
        extras.insert(slugs::CONDITION.to_string(), AttributeValue::Enum { value: "New".into() });
        let predicate = build(&intent, &extras, FilterBuilderOptions { include_category: true });
        assert!(predicate.extra_enum.contains(&(slugs::CONDITION.to_string(), "new".to_string())));
    }
}
