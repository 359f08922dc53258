//! Query-time view over a listing: substring filter and name/city ordering.
//!
//! Everything here reorders or narrows an in-memory sequence; the store is
//! never touched.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use icu_collator::{Collator, CollatorOptions, Strength};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::SchoolSummary;

static COLLATOR: Lazy<Collator> = Lazy::new(|| {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    Collator::try_new(&Default::default(), options).expect("root collation data")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    City,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => f.write_str("name"),
            SortKey::City => f.write_str("city"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown sort key {0:?}, expected \"name\" or \"city\"")]
pub struct SortKeyParseError(String);

impl FromStr for SortKey {
    type Err = SortKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "city" => Ok(SortKey::City),
            _ => Err(SortKeyParseError(s.to_string())),
        }
    }
}

/// Root-locale collation: accents and case only break ties between
/// otherwise equal strings, lowercase first.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    COLLATOR.compare(a, b)
}

/// Case-insensitive substring match on name, city or address. The query is
/// used as given; only the empty string selects everything.
pub fn matches(school: &SchoolSummary, query: &str) -> bool {
    let needle = query.to_lowercase();
    needle.is_empty()
        || [&school.name, &school.city, &school.address]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter(schools: &[SchoolSummary], query: &str) -> Vec<SchoolSummary> {
    schools
        .iter()
        .filter(|school| matches(school, query))
        .cloned()
        .collect()
}

pub fn sort_by_name(schools: &mut [SchoolSummary]) {
    schools.sort_by(|a, b| compare_text(&a.name, &b.name));
}

pub fn sort_by_city(schools: &mut [SchoolSummary]) {
    schools.sort_by(|a, b| compare_text(&a.city, &b.city));
}

pub fn sort(schools: &mut [SchoolSummary], key: SortKey) {
    match key {
        SortKey::Name => sort_by_name(schools),
        SortKey::City => sort_by_city(schools),
    }
}

/// Filter then optionally sort.
pub fn view(schools: &[SchoolSummary], query: &str, key: Option<SortKey>) -> Vec<SchoolSummary> {
    let mut selected = filter(schools, query);
    if let Some(key) = key {
        sort(&mut selected, key);
    }
    selected
}
