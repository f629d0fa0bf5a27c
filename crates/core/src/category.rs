//! Category tree (spec §3).
//!
//! Invariant: the tree is acyclic; `level == depth(parent) + 1`; a leaf has
//! no active children. Parent references are resolved by id lookup, never
//! materialized as owning references (spec §9 "Cyclic references").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub slug: String,
    pub name_ar: String,
    pub name_en: String,
    /// 0 = root, higher = more specific.
    pub level: i32,
    pub parent_id: Option<i64>,
    /// Materialized path, e.g. `"/1/14/52"`.
    pub path: String,
    pub active: bool,
    pub sort_order: i32,
}

impl Category {
    pub fn localized_name(&self, language: crate::Language) -> &str {
        match language {
            crate::Language::Ar => &self.name_ar,
            crate::Language::En => &self.name_en,
        }
    }

    /// A leaf is a category that (per the caller-supplied active-children
    /// count) has no active descendants one level down. Callers resolve
    /// this via the repository rather than in-memory traversal, since the
    /// tree is not materialized as owning references.
    pub fn is_leaf(&self, active_child_count: usize) -> bool {
        active_child_count == 0
    }
}

/// Curated keyword lists for a category, in both languages, used by
/// `DBMatcher`'s keyword-array strategies (spec §4.3.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category_id: i64,
    pub keywords_ar: Vec<String>,
    pub keywords_en: Vec<String>,
    pub meta_keywords_ar: String,
    pub meta_keywords_en: String,
}

impl CategoryKeywords {
    pub fn keywords(&self, language: crate::Language) -> &[String] {
        match language {
            crate::Language::Ar => &self.keywords_ar,
            crate::Language::En => &self.keywords_en,
        }
    }

    pub fn meta_keywords(&self, language: crate::Language) -> &str {
        match language {
            crate::Language::Ar => &self.meta_keywords_ar,
            crate::Language::En => &self.meta_keywords_en,
        }
    }
}

/// A category bundled with its curated keywords, the unit `HotCache`
/// caches and `DBMatcher` scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithKeywords {
    pub category: Category,
    pub keywords: CategoryKeywords,
}

/// A resolved category reference as carried on an `Intent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub level: i32,
    pub confidence: f32,
}
