//! Transaction type: a small closed set (spec §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionTypeSlug {
    ForSale,
    ForRentMonthly,
    ForRentDaily,
    ForRentYearly,
    ForExchange,
    ServiceRequested,
    ServiceOffered,
    JobPosting,
    JobSeeking,
}

impl TransactionTypeSlug {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForSale => "for-sale",
            Self::ForRentMonthly => "for-rent-monthly",
            Self::ForRentDaily => "for-rent-daily",
            Self::ForRentYearly => "for-rent-yearly",
            Self::ForExchange => "for-exchange",
            Self::ServiceRequested => "service-requested",
            Self::ServiceOffered => "service-offered",
            Self::JobPosting => "job-posting",
            Self::JobSeeking => "job-seeking",
        }
    }

    pub fn all() -> [TransactionTypeSlug; 9] {
        [
            Self::ForSale,
            Self::ForRentMonthly,
            Self::ForRentDaily,
            Self::ForRentYearly,
            Self::ForExchange,
            Self::ServiceRequested,
            Self::ServiceOffered,
            Self::JobPosting,
            Self::JobSeeking,
        ]
    }
}

impl std::fmt::Display for TransactionTypeSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionType {
    pub id: i64,
    pub slug: TransactionTypeSlug,
    pub name_ar: String,
    pub name_en: String,
}

/// A resolved transaction-type reference as carried on an `Intent`.
/// `None` on the `Intent` means "search across all types" — the matcher
/// never defaults to `for-sale` (spec §4.3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMatch {
    pub slug: TransactionTypeSlug,
    pub confidence: f32,
}
