use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::jobs::repo_types::{ApplicationRecord, ApplicationStatus};

const TOP_N: usize = 5;
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStats {
    pub total_applications: usize,
    pub status_counts: BTreeMap<ApplicationStatus, usize>,
    pub location_counts: BTreeMap<String, usize>,
    pub company_counts: BTreeMap<String, usize>,
    /// Percentage of Offer + Accepted, one decimal place; "0" with no records.
    pub success_rate: String,
    /// `[name, count]` pairs, most frequent first.
    pub top_locations: Vec<(String, usize)>,
    pub top_companies: Vec<(String, usize)>,
}

fn label(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() { UNKNOWN.to_string() } else { v.to_string() }
}

fn top(counts: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut pairs: Vec<_> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // BTreeMap iteration is name-ordered, so a stable sort breaks ties by name
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.truncate(TOP_N);
    pairs
}

pub fn summarize(records: &[ApplicationRecord]) -> ApplicationStats {
    let mut status_counts: BTreeMap<ApplicationStatus, usize> =
        ApplicationStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut locations: HashMap<String, usize> = HashMap::new();
    let mut companies: HashMap<String, usize> = HashMap::new();

    for r in records {
        *status_counts.entry(r.status).or_default() += 1;
        *locations.entry(label(&r.location)).or_default() += 1;
        *companies.entry(label(&r.company)).or_default() += 1;
    }

    let total = records.len();
    let successful: usize = status_counts
        .iter()
        .filter(|(s, _)| s.is_success())
        .map(|(_, n)| n)
        .sum();
    let success_rate = if total == 0 {
        "0".to_string()
    } else {
        format!("{:.1}", successful as f64 / total as f64 * 100.0)
    };

    let location_counts: BTreeMap<_, _> = locations.into_iter().collect();
    let company_counts: BTreeMap<_, _> = companies.into_iter().collect();

    ApplicationStats {
        total_applications: total,
        top_locations: top(&location_counts),
        top_companies: top(&company_counts),
        status_counts,
        location_counts,
        company_counts,
        success_rate,
    }
}
