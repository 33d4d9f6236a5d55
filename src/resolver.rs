//! ZIP -> location resolution with 5/4/3-digit fallback
//!
//! Records are indexed once per tier so a lookup is at most three hash lookups.
//! When more than one record carries the same token the record that comes
//! first in store order owns it; later duplicates are ignored.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::ZipRouteError;
use crate::models::{LocationRecord, Resolution};
use crate::zip_tokens::{MatchType, Zip5};

/// Per-tier token index over a snapshot of the store
#[derive(Debug, Clone, Default)]
pub struct ZipIndex {
    records: Vec<LocationRecord>,
    zip5: HashMap<String, usize>,
    zip4: HashMap<String, usize>,
    zip3: HashMap<String, usize>,
}

impl ZipIndex {
    /// Build from records in store enumeration order
    pub fn build(records: Vec<LocationRecord>) -> Self {
        let mut index = Self {
            records: Vec::new(),
            zip5: HashMap::new(),
            zip4: HashMap::new(),
            zip3: HashMap::new(),
        };

        for (pos, record) in records.iter().enumerate() {
            for token in &record.referring_zips {
                let Some(tier) = MatchType::of_token(token) else {
                    warn!("Skipping malformed ZIP token {:?} on {}", token, record.name);
                    continue;
                };
                index.tier_mut(tier).entry(token.clone()).or_insert(pos);
            }
        }
        index.records = records;
        index
    }

    fn tier(&self, tier: MatchType) -> &HashMap<String, usize> {
        match tier {
            MatchType::Zip5 => &self.zip5,
            MatchType::Zip4 => &self.zip4,
            MatchType::Zip3 => &self.zip3,
        }
    }

    fn tier_mut(&mut self, tier: MatchType) -> &mut HashMap<String, usize> {
        match tier {
            MatchType::Zip5 => &mut self.zip5,
            MatchType::Zip4 => &mut self.zip4,
            MatchType::Zip3 => &mut self.zip3,
        }
    }

    /// Record and tier for a validated ZIP, most specific tier first
    pub fn lookup(&self, zip: &Zip5) -> Option<(&LocationRecord, MatchType)> {
        MatchType::FALLBACK_ORDER.into_iter().find_map(|tier| {
            self.tier(tier)
                .get(zip.prefix(tier))
                .map(|&pos| (&self.records[pos], tier))
        })
    }

    /// Resolve a raw 5-digit ZIP string. `Ok(None)` means no tier matched.
    pub fn resolve(&self, zip: &str) -> Result<Option<Resolution>, ZipRouteError> {
        let zip = Zip5::parse(zip)?;
        let found = self.lookup(&zip);
        match found {
            Some((record, tier)) => {
                debug!("ZIP {} matched {} ({})", zip, record.name, tier);
                Ok(Some(Resolution::from_record(record, tier)))
            }
            None => {
                debug!("ZIP {} has no matching location", zip);
                Ok(None)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
