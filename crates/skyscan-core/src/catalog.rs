// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Raw two-line element pair as delivered by the catalog provider.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlePair {
    #[cfg_attr(feature = "serde", serde(rename = "TLE_LINE1"))]
    pub line1: String,
    #[cfg_attr(feature = "serde", serde(rename = "TLE_LINE2"))]
    pub line2: String,
}

/// One ingested catalog record.
///
/// Immutable after ingestion; downstream stages derive new records instead of
/// mutating this one. `norad_id` is the unique key within a snapshot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    #[cfg_attr(feature = "serde", serde(rename = "OBJECT_NAME"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "NORAD_CAT_ID"))]
    pub norad_id: u32,
    #[cfg_attr(feature = "serde", serde(rename = "COUNTRY", default))]
    pub country: String,
    #[cfg_attr(feature = "serde", serde(rename = "LAUNCH_DATE", default))]
    pub launch_date: String,
    #[cfg_attr(feature = "serde", serde(rename = "TLE_DATA", default))]
    pub tle: Option<TlePair>,
}

impl CatalogEntry {
    pub fn has_elements(&self) -> bool {
        self.tle
            .as_ref()
            .is_some_and(|pair| !pair.line1.is_empty() && !pair.line2.is_empty())
    }
}

/// Coarse object category derived from the catalog name.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectCategory {
    Debris,
    RocketBody,
    Satellite,
}

impl ObjectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debris => "Debris",
            Self::RocketBody => "Rocket Body",
            Self::Satellite => "Satellite",
        }
    }
}

/// Ordered substring rules; the first match wins.
const CATEGORY_RULES: [(&str, ObjectCategory); 3] = [
    ("DEB", ObjectCategory::Debris),
    ("R/B", ObjectCategory::RocketBody),
    ("ROCKET", ObjectCategory::RocketBody),
];

/// Classifies an object name into a category via case-insensitive substring
/// rules, defaulting to `Satellite` when no rule matches.
pub fn classify_object_name(name: &str) -> ObjectCategory {
    let upper = name.to_ascii_uppercase();
    for (pattern, category) in CATEGORY_RULES {
        if upper.contains(pattern) {
            return category;
        }
    }
    ObjectCategory::Satellite
}
