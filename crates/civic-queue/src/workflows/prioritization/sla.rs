use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::Category;

/// SLA days applied when a category has no entry of its own.
pub const DEFAULT_SLA_DAYS: u32 = 30;

/// Injected mapping from procedure category to the legal processing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaTable {
    #[serde(default = "default_sla_days")]
    default_days: u32,
    #[serde(default)]
    days: BTreeMap<Category, u32>,
}

fn default_sla_days() -> u32 {
    DEFAULT_SLA_DAYS
}

/// Outcome of an SLA lookup, distinguishing table hits from the default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaLookup {
    Listed(u32),
    Default(u32),
}

impl SlaLookup {
    pub const fn days(self) -> u32 {
        match self {
            SlaLookup::Listed(days) | SlaLookup::Default(days) => days,
        }
    }
}

impl SlaTable {
    /// Statutory windows for the procedures handled at the front desk.
    pub fn standard() -> Self {
        Self::empty(DEFAULT_SLA_DAYS)
            .with_category(Category::CertificatUrbanism, 30)
            .with_category(Category::AutorizatieConstruire, 60)
            .with_category(Category::AutorizatieDemolare, 30)
            .with_category(Category::AvizPreliminar, 15)
    }

    pub fn empty(default_days: u32) -> Self {
        Self {
            default_days,
            days: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: Category, days: u32) -> Self {
        self.days.insert(category, days);
        self
    }

    pub fn with_default_days(mut self, default_days: u32) -> Self {
        self.default_days = default_days;
        self
    }

    pub fn default_days(&self) -> u32 {
        self.default_days
    }

    pub fn lookup(&self, category: &Category) -> SlaLookup {
        match self.days.get(category) {
            Some(days) => SlaLookup::Listed(*days),
            None => SlaLookup::Default(self.default_days),
        }
    }
}

impl Default for SlaTable {
    fn default() -> Self {
        Self::standard()
    }
}
