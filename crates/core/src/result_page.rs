//! `ResultPage`: the paginated output of `RetrievalOrchestrator.search`
//! (spec §4.9, §6).

use serde::{Deserialize, Serialize};

use crate::listing::Listing;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPage {
    pub listings: Vec<Listing>,
    pub page: u32,
    pub limit: u32,
    pub cached: bool,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
