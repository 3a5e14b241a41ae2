use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::filter::AgeBracket;
use crate::records::{capitalize, display_label, ChildRecord, EducationStatus};

/// Static month-over-month growth shown on the dashboard; not computed from data.
pub const IMPACT_GROWTH_PLACEHOLDER_PCT: u32 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateBucket {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Aggregates {
    pub by_district: Vec<AggregateBucket>,
    pub by_education: Vec<AggregateBucket>,
    pub by_gender: Vec<AggregateBucket>,
    pub by_age_bracket: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub total_children: usize,
    pub educated_children: usize,
    pub healthy_children: usize,
    pub verified_children: usize,
    pub educated_pct: f64,
    pub healthy_pct: f64,
    pub verified_pct: f64,
    pub impact_growth_pct: u32,
}

pub fn aggregate(records: &[ChildRecord]) -> Aggregates {
    Aggregates {
        by_district: group_by(records, |c| c.district.clone(), |key| district_label(key)),
        by_education: group_by(
            records,
            |c| c.education_status.as_str().to_string(),
            |key| display_label(key),
        ),
        by_gender: group_by(records, |c| c.gender.as_str().to_string(), |key| capitalize(key)),
        by_age_bracket: age_buckets(records),
    }
}

pub fn summarize(records: &[ChildRecord]) -> SummaryStats {
    let total_children = records.len();
    let educated_children = records
        .iter()
        .filter(|c| c.education_status != EducationStatus::None)
        .count();
    let healthy_children = records
        .iter()
        .filter(|c| c.health_status.is_healthy())
        .count();
    let verified_children = records.iter().filter(|c| c.verified).count();

    SummaryStats {
        total_children,
        educated_children,
        healthy_children,
        verified_children,
        educated_pct: share_percent(educated_children, total_children),
        healthy_pct: share_percent(healthy_children, total_children),
        verified_pct: share_percent(verified_children, total_children),
        impact_growth_pct: IMPACT_GROWTH_PLACEHOLDER_PCT,
    }
}

pub fn share_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64) * 100.0
}

pub fn bucket_total(buckets: &[AggregateBucket]) -> usize {
    buckets.iter().map(|b| b.count).sum()
}

/// Display-only shortening: "Mumbai Central" -> "Mumbai".
pub fn district_label(district: &str) -> String {
    district
        .split_whitespace()
        .next()
        .unwrap_or(district)
        .to_string()
}

fn group_by<K, L>(records: &[ChildRecord], key_of: K, label_of: L) -> Vec<AggregateBucket>
where
    K: Fn(&ChildRecord) -> String,
    L: Fn(&str) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<AggregateBucket> = Vec::new();
    for child in records {
        let key = key_of(child);
        match index.get(&key) {
            Some(&slot) => buckets[slot].count += 1,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(AggregateBucket {
                    label: label_of(&key),
                    key,
                    count: 1,
                });
            }
        }
    }
    buckets
}

fn age_buckets(records: &[ChildRecord]) -> Vec<AggregateBucket> {
    let mut counts = [0usize; 4];
    for child in records {
        counts[AgeBracket::for_age(child.age) as usize] += 1;
    }
    AgeBracket::ALL
        .iter()
        .zip(counts)
        .map(|(bracket, count)| AggregateBucket {
            key: bracket.key().to_string(),
            label: bracket.key().to_string(),
            count,
        })
        .collect()
}
