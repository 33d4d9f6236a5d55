use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use surrealdb::RecordId;

use crate::zip_tokens::{self, MatchType};

/// Raw row from a location CSV export
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRecord {
    pub name: String,
    pub address: Option<String>,
    pub suite: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub hours: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referring_zips: Option<String>,
    pub calendar_url: Option<String>,
    pub contact_pref: Option<String>,
}

/// Location fields as stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationContent {
    pub name: String,
    pub address: Option<String>,
    pub suite: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub hours: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `|`-joined ZIP tokens
    pub referring_zips: Option<String>,
    pub calendar_url: Option<String>,
    pub contact_pref: Option<String>,
}

/// Location with ID from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: RecordId,
    #[serde(flatten)]
    pub location: LocationContent,
}

/// One physical office/site with its referring ZIP tokens decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub suite: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub hours: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referring_zips: Vec<String>,
    pub calendar_url: Option<String>,
    pub contact_pref: Option<String>,
}

impl LocationRecord {
    /// Minimal record, mostly for tests and fixtures
    pub fn new(id: impl Into<String>, name: impl Into<String>, zips: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            suite: None,
            phone: None,
            email: None,
            website: None,
            image_url: None,
            hours: None,
            category: None,
            latitude: None,
            longitude: None,
            referring_zips: zips.iter().map(|z| z.to_string()).collect(),
            calendar_url: None,
            contact_pref: None,
        }
    }

    /// Street address with the suite appended when present
    pub fn full_address(&self) -> Option<String> {
        match (&self.address, &self.suite) {
            (Some(address), Some(suite)) if !suite.is_empty() => Some(format!("{} {}", address, suite)),
            (address, _) => address.clone(),
        }
    }
}

impl From<LocationRow> for LocationRecord {
    fn from(row: LocationRow) -> Self {
        let l = row.location;
        Self {
            id: row.id.to_string(),
            referring_zips: zip_tokens::decode(l.referring_zips.as_deref()),
            name: l.name,
            address: l.address,
            suite: l.suite,
            phone: l.telephone,
            email: l.email,
            website: l.website,
            image_url: l.image_url,
            hours: l.hours,
            category: l.category,
            latitude: l.latitude,
            longitude: l.longitude,
            calendar_url: l.calendar_url,
            contact_pref: l.contact_pref,
        }
    }
}

impl CsvRecord {
    pub fn to_location(&self) -> LocationContent {
        let zips = zip_tokens::decode(self.referring_zips.as_deref());
        LocationContent {
            name: self.name.trim().to_string(),
            address: non_empty(&self.address),
            suite: non_empty(&self.suite),
            telephone: non_empty(&self.telephone),
            email: non_empty(&self.email),
            website: non_empty(&self.website),
            image_url: non_empty(&self.image_url),
            hours: non_empty(&self.hours),
            category: non_empty(&self.category),
            latitude: self.latitude,
            longitude: self.longitude,
            referring_zips: Some(zip_tokens::encode(&zips)),
            calendar_url: non_empty(&self.calendar_url),
            contact_pref: non_empty(&self.contact_pref),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Complete ZIP token -> location name assignment from one map editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipAssignmentProposal {
    pub assignments: BTreeMap<String, String>,
}

impl ZipAssignmentProposal {
    pub fn new(assignments: BTreeMap<String, String>) -> Self {
        Self { assignments }
    }

    /// Tokens assigned to `location`, sorted
    pub fn zips_for(&self, location: &str) -> Vec<String> {
        self.assignments
            .iter()
            .filter(|(_, name)| name.as_str() == location)
            .map(|(zip, _)| zip.clone())
            .collect()
    }

    /// Location names that receive at least one token
    pub fn location_names(&self) -> BTreeSet<&str> {
        self.assignments.values().map(String::as_str).collect()
    }

    pub fn contains_zip(&self, zip: &str) -> bool {
        self.assignments.contains_key(zip)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ZipAssignmentProposal {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Successful lookup returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub location: String,
    pub match_type: MatchType,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub calendar_url: Option<String>,
    pub contact_pref: Option<String>,
    pub image_url: Option<String>,
}

impl Resolution {
    pub fn from_record(record: &LocationRecord, match_type: MatchType) -> Self {
        Self {
            location: record.name.clone(),
            match_type,
            address: record.address.clone(),
            phone: record.phone.clone(),
            calendar_url: record.calendar_url.clone(),
            contact_pref: record.contact_pref.clone(),
            image_url: record.image_url.clone(),
        }
    }
}

/// Site entry handed to the map editor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSite {
    pub id: String,
    pub location_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub hours: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referring_zips: Vec<String>,
}

impl From<&LocationRecord> for MapSite {
    fn from(r: &LocationRecord) -> Self {
        Self {
            id: r.id.clone(),
            location_name: r.name.clone(),
            address: r.full_address(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            website: r.website.clone(),
            image_url: r.image_url.clone(),
            hours: r.hours.clone(),
            category: r.category.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
            referring_zips: r.referring_zips.clone(),
        }
    }
}

/// Everything the map editor needs to start a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    pub sites: Vec<MapSite>,
    pub initial_map: BTreeMap<String, String>,
}

impl MapSnapshot {
    /// Build from records in store order. A token held by several records
    /// maps to the first one, matching resolution tie-breaks.
    pub fn from_records(records: &[LocationRecord]) -> Self {
        let mut initial_map = BTreeMap::new();
        for record in records {
            for zip in &record.referring_zips {
                initial_map
                    .entry(zip.clone())
                    .or_insert_with(|| record.name.clone());
            }
        }
        Self {
            sites: records.iter().map(MapSite::from).collect(),
            initial_map,
        }
    }
}
