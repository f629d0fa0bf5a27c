//! DBMatcher: resolves tokens/text to catalog entities (spec §4.3).
//!
//! Strategies within each `match*` function are tried in order; the
//! first non-null result wins. HotCache strategies run in-process;
//! everything past them goes to the store.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use souq_core::{
    Category, CategoryMatch, CategoryRepository, Language, LocationKind, LocationMatch,
    LocationRepository, TransactionMatch, TransactionTypeSlug,
};
use souq_text::ta_marbuta_variant;

use crate::error::Result;
use crate::hot_cache::HotCache;

fn lower_fold(s: &str) -> String {
    ta_marbuta_variant(&s.to_lowercase())
}

/// A keyword `k` matches a token `t` per spec §4.3.1 #1/#2: exact
/// (case/ta-marbuta-folded) equality, or substring containment with
/// `min(|k|, |t|) >= 4` and overlap >= 80% of the shorter string.
fn keyword_matches_token(keyword: &str, token: &str) -> bool {
    let k = keyword.to_lowercase();
    let t = token.to_lowercase();
    if k == t || lower_fold(&k) == lower_fold(&t) {
        return true;
    }
    let (shorter, longer) = if k.chars().count() <= t.chars().count() {
        (&k, &t)
    } else {
        (&t, &k)
    };
    let shorter_len = shorter.chars().count();
    if shorter_len < 4 {
        return false;
    }
    if longer.contains(shorter.as_str()) {
        let overlap = shorter_len as f32 / longer.chars().count().max(1) as f32;
        overlap >= 0.8
    } else {
        false
    }
}

/// Meaningful tokens: length >= 3 for category matching (spec §4.3.1),
/// length > 2 for location matching (spec §4.3.2).
fn meaningful(tokens: &[String], min_len: usize) -> Vec<&String> {
    tokens.iter().filter(|t| t.chars().count() >= min_len).collect()
}

pub struct DbMatcher {
    hot_cache: Arc<HotCache>,
    category_repo: Arc<dyn CategoryRepository>,
    location_repo: Arc<dyn LocationRepository>,
}

impl DbMatcher {
    pub fn new(
        hot_cache: Arc<HotCache>,
        category_repo: Arc<dyn CategoryRepository>,
        location_repo: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            hot_cache,
            category_repo,
            location_repo,
        }
    }

    /// spec §4.3.1.
    pub async fn match_category(&self, tokens: &[String], language: Language) -> Result<Option<CategoryMatch>> {
        let meaningful_tokens = meaningful(tokens, 3);
        if meaningful_tokens.is_empty() {
            return Ok(None);
        }

        // Strategy 1: HotCache keyword hit.
        let snapshot = self.hot_cache.snapshot();
        for entry in &snapshot.top_categories {
            let keywords = entry.keywords.keywords(language);
            for token in &meaningful_tokens {
                if keywords.iter().any(|k| keyword_matches_token(k, token)) {
                    return Ok(Some(category_match(&entry.category, 0.95)));
                }
            }
        }

        let token_strings: Vec<String> = meaningful_tokens.iter().map(|s| s.to_string()).collect();

        // Strategy 2: DB keyword-array match.
        let mut keyword_hits = self.category_repo.keyword_array_match(&token_strings, language).await?;
        if !keyword_hits.is_empty() {
            keyword_hits.sort_by(|a, b| {
                b.1.cmp(&a.1)
                    .then(b.0.level.cmp(&a.0.level))
                    .then(a.0.sort_order.cmp(&b.0.sort_order))
            });
            let (category, match_count) = &keyword_hits[0];
            let confidence = if *match_count >= 2 { 0.95 } else { 0.70 };
            return Ok(Some(category_match(category, confidence)));
        }

        // Strategy 3: DB meta-keyword ILIKE.
        for token in &token_strings {
            let hits = self.category_repo.meta_keyword_ilike(token, language).await?;
            if let Some(category) = best_by_level(hits) {
                return Ok(Some(category_match(&category, 0.85)));
            }
        }

        // Strategy 4: full-text search.
        let query = token_strings.join(" ");
        let fts_hits = self.category_repo.fulltext_search(&query, language).await?;
        if let Some((category, _rank)) = best_ranked(fts_hits) {
            return Ok(Some(category_match(&category, 0.85)));
        }

        // Strategy 5: trigram similarity on the first token.
        if let Some(first) = token_strings.first() {
            let trigram_hits = self.category_repo.trigram_similar(first).await?;
            let best = trigram_hits
                .into_iter()
                .filter(|(_, score)| *score > 0.3)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((category, score)) = best {
                return Ok(Some(category_match(&category, score.min(0.75))));
            }
        }

        Ok(None)
    }

    /// spec §4.3.2.
    pub async fn match_location(&self, tokens: &[String], _language: Language) -> Result<Option<LocationMatch>> {
        let meaningful_tokens = meaningful(tokens, 3);
        if meaningful_tokens.is_empty() {
            return Ok(None);
        }

        let snapshot = self.hot_cache.snapshot();

        // Strategy 1: HotCache hit.
        for token in &meaningful_tokens {
            let t = token.to_lowercase();
            for city in &snapshot.cities {
                let name = city.name_ar.to_lowercase();
                let name_en = city.name_en.to_lowercase();
                let province = city.province_name_ar.to_lowercase();
                let province_en = city.province_name_en.to_lowercase();
                if name.contains(&t) || t.contains(&name) || name_en.contains(&t) || t.contains(&name_en)
                    || province.contains(&t) || t.contains(&province) || province_en.contains(&t) || t.contains(&province_en)
                {
                    return Ok(Some(LocationMatch {
                        id: city.id,
                        kind: LocationKind::City,
                        name: city.name_en.clone(),
                        confidence: 0.95,
                    }));
                }
            }
        }

        // Strategy 2: city similarity.
        if let Some(first) = meaningful_tokens.first() {
            let hits = self.location_repo.trigram_similar_cities(first).await?;
            let best = hits
                .into_iter()
                .filter(|(_, score)| *score > 0.4)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((city, _score)) = best {
                return Ok(Some(LocationMatch {
                    id: city.id,
                    kind: LocationKind::City,
                    name: city.name_en.clone(),
                    confidence: 0.90,
                }));
            }
        }

        // Strategy 3: neighborhood similarity.
        if let Some(first) = meaningful_tokens.first() {
            let hits = self.location_repo.trigram_similar_neighborhoods(first).await?;
            let best = hits
                .into_iter()
                .filter(|(_, score)| *score > 0.4)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((neighborhood, _score)) = best {
                return Ok(Some(LocationMatch {
                    id: neighborhood.id,
                    kind: LocationKind::Neighborhood,
                    name: neighborhood.name_en.clone(),
                    confidence: 0.85,
                }));
            }
        }

        Ok(None)
    }

    /// spec §4.3.3: static pattern table, case-insensitive. Never
    /// defaults to `for-sale`; a null result means "search across all
    /// types" (spec §9 open question, resolved: "مطلوب" alone maps to
    /// service-requested, general search verbs set nothing).
    pub fn match_transaction_type(&self, text: &str, _language: Language) -> Option<TransactionMatch> {
        for (pattern, slug) in TRANSACTION_PATTERNS.iter() {
            if pattern.is_match(text) {
                return Some(TransactionMatch {
                    slug: *slug,
                    confidence: 0.90,
                });
            }
        }
        None
    }

    /// spec §4.3.4: among active leaves under `parent_id`, rank by
    /// `max(similarity(name, hints), max_keyword_similarity)`.
    pub async fn find_leaf_category(
        &self,
        parent_id: i64,
        hints: &[String],
        language: Language,
    ) -> Result<Option<Category>> {
        let descendants = self.category_repo.active_descendants_with_keywords(parent_id).await?;
        let mut best: Option<(Category, f32)> = None;

        for candidate in descendants {
            let active_children = self.category_repo.active_child_count(candidate.category.id).await?;
            if active_children > 0 {
                continue; // not a leaf
            }

            let name = candidate.category.localized_name(language).to_lowercase();
            let name_score = hints
                .iter()
                .map(|h| trigram_like_similarity(&name, &h.to_lowercase()))
                .fold(0.0f32, f32::max);

            let keywords = candidate.keywords.keywords(language);
            let max_keyword_similarity = hints
                .iter()
                .flat_map(|h| keywords.iter().map(move |k| trigram_like_similarity(&k.to_lowercase(), &h.to_lowercase())))
                .fold(0.0f32, f32::max);

            let score = name_score.max(max_keyword_similarity);
            if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((candidate.category, score));
            }
        }

        Ok(best.map(|(category, _)| category))
    }
}

fn category_match(category: &Category, confidence: f32) -> CategoryMatch {
    CategoryMatch {
        id: category.id,
        slug: category.slug.clone(),
        name: category.name_en.clone(),
        level: category.level,
        confidence,
    }
}

fn best_by_level(mut hits: Vec<Category>) -> Option<Category> {
    hits.sort_by(|a, b| b.level.cmp(&a.level).then(a.sort_order.cmp(&b.sort_order)));
    hits.into_iter().next()
}

fn best_ranked(hits: Vec<(Category, f32)>) -> Option<(Category, f32)> {
    hits.into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// A crude in-process trigram-like similarity, used only for
/// `findLeafCategory`'s name-vs-hint comparison where an extra store
/// round trip per candidate would be wasteful; the store's own
/// `pg_trgm` similarity backs every other trigram use in this module.
fn trigram_like_similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(b) || b.contains(a) {
        let shorter = a.len().min(b.len()) as f32;
        let longer = a.len().max(b.len()) as f32;
        return shorter / longer;
    }
    0.0
}

static TRANSACTION_PATTERNS: Lazy<Vec<(Regex, TransactionTypeSlug)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\u{0645}\u{0637}\u{0644}\u{0648}\u{0628}").unwrap(), TransactionTypeSlug::ServiceRequested), // مطلوب
        (Regex::new(r"(?i)for\s*sale|\u{0644}\u{0644}\u{0628}\u{064A}\u{0639}").unwrap(), TransactionTypeSlug::ForSale),
        (Regex::new(r"(?i)\u{0644}\u{0644}\u{0625}\u{064A}\u{062C}\u{0627}\u{0631}.*\u{0634}\u{0647}\u{0631}|rent.*month").unwrap(), TransactionTypeSlug::ForRentMonthly),
        (Regex::new(r"(?i)\u{0644}\u{0644}\u{0625}\u{064A}\u{062C}\u{0627}\u{0631}.*\u{064A}\u{0648}\u{0645}|rent.*day").unwrap(), TransactionTypeSlug::ForRentDaily),
        (Regex::new(r"(?i)\u{0644}\u{0644}\u{0625}\u{064A}\u{062C}\u{0627}\u{0631}.*\u{0633}\u{0646}\u{0629}|rent.*year").unwrap(), TransactionTypeSlug::ForRentYearly),
        (Regex::new(r"(?i)for\s*rent|\u{0644}\u{0644}\u{0625}\u{064A}\u{062C}\u{0627}\u{0631}").unwrap(), TransactionTypeSlug::ForRentMonthly),
        (Regex::new(r"(?i)\u{0644}\u{0644}\u{0645}\u{0628}\u{0627}\u{062F}\u{0644}\u{0629}|exchange").unwrap(), TransactionTypeSlug::ForExchange),
        (Regex::new(r"(?i)\u{0639}\u{0631}\u{0636}\u{062E}\u{062F}\u{0645}\u{0629}|service\s*offered").unwrap(), TransactionTypeSlug::ServiceOffered),
        (Regex::new(r"(?i)\u{0648}\u{0638}\u{064A}\u{0641}\u{0629}\s*\u{0634}\u{0627}\u{063A}\u{0631}\u{0629}|job\s*post").unwrap(), TransactionTypeSlug::JobPosting),
        (Regex::new(r"(?i)\u{0628}\u{062D}\u{062B}\s*\u{0639}\u{0646}\s*\u{0639}\u{0645}\u{0644}|job\s*seek").unwrap(), TransactionTypeSlug::JobSeeking),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_on_exact_lowercase() {
        assert!(keyword_matches_token("Toyota", "toyota"));
    }

    #[test]
    fn keyword_matches_on_substring_with_length_floor() {
        assert!(keyword_matches_token("camry2020", "camry"));
        assert!(!keyword_matches_token("ab", "a"));
    }

    #[test]
    fn matloob_maps_to_service_requested() {
        let matcher_pattern = TRANSACTION_PATTERNS
            .iter()
            .find(|(_, slug)| *slug == TransactionTypeSlug::ServiceRequested)
            .unwrap();
        assert!(matcher_pattern.0.is_match("\u{0645}\u{0637}\u{0644}\u{0648}\u{0628} \u{0633}\u{064A}\u{0627}\u{0631}\u{0629}"));
    }

    #[test]
    fn unrecognized_text_sets_no_transaction_type() {
        assert!(!TRANSACTION_PATTERNS.iter().any(|(p, _)| p.is_match("\u{0628}\u{062F}\u{064A} \u{0633}\u{064A}\u{0627}\u{0631}\u{0629}")));
    }
}
