use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::records::ChildRecord;

pub const NEED_PER_CHILD: f64 = 15_000.0;
/// Upper bound of the simulated funding drawn per child.
pub const SIMULATED_FUNDING_PER_CHILD: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HeatPriority {
    Low,
    Medium,
    High,
}

impl HeatPriority {
    pub fn from_density(density: usize) -> Self {
        if density > 20 {
            Self::High
        } else if density > 10 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistrictHeat {
    pub district: String,
    pub density: usize,
    pub verified: usize,
    pub locations: usize,
    pub funding_need: f64,
    pub current_funding: f64,
    pub funding_gap: f64,
    pub priority: HeatPriority,
}

pub fn district_heatmap_seeded(records: &[ChildRecord], seed: Option<u64>) -> Vec<DistrictHeat> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    district_heatmap(records, &mut rng)
}

/// Densest district first; districts with equal counts keep first-seen order.
pub fn district_heatmap<R: Rng>(records: &[ChildRecord], rng: &mut R) -> Vec<DistrictHeat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut locations: Vec<HashSet<&str>> = Vec::new();
    let mut rows: Vec<DistrictHeat> = Vec::new();

    for child in records {
        let slot = *index.entry(child.district.as_str()).or_insert_with(|| {
            rows.push(DistrictHeat {
                district: child.district.clone(),
                density: 0,
                verified: 0,
                locations: 0,
                funding_need: 0.0,
                current_funding: 0.0,
                funding_gap: 0.0,
                priority: HeatPriority::Low,
            });
            locations.push(HashSet::new());
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.density += 1;
        if child.verified {
            row.verified += 1;
        }
        locations[slot].insert(child.location.as_str());
        row.funding_need += NEED_PER_CHILD;
        row.current_funding += rng.random_range(0.0..SIMULATED_FUNDING_PER_CHILD);
    }

    for (row, seen) in rows.iter_mut().zip(&locations) {
        row.locations = seen.len();
        row.funding_gap = row.funding_need - row.current_funding;
        row.priority = HeatPriority::from_density(row.density);
    }
    rows.sort_by(|a, b| b.density.cmp(&a.density));
    rows
}

#[cfg(test)]
mod tests {
    use super::{district_heatmap_seeded, HeatPriority, NEED_PER_CHILD};
    use crate::engine::tests::child;

    #[test]
    fn groups_by_district_and_sorts_by_density() {
        let mut records = Vec::new();
        for i in 0..12 {
            let mut c = child(&format!("a{i}"), "A", 8);
            c.district = "Pune East".to_string();
            c.location = if i % 2 == 0 { "Hadapsar" } else { "Kharadi" }.to_string();
            c.verified = i < 5;
            records.push(c);
        }
        let mut lone = child("b", "B", 9);
        lone.district = "Nagpur".to_string();
        records.insert(0, lone);

        let heat = district_heatmap_seeded(&records, Some(5));
        assert_eq!(heat.len(), 2);
        assert_eq!(heat[0].district, "Pune East");
        assert_eq!(heat[0].density, 12);
        assert_eq!(heat[0].verified, 5);
        assert_eq!(heat[0].locations, 2);
        assert_eq!(heat[0].priority, HeatPriority::Medium);
        assert!((heat[0].funding_need - 12.0 * NEED_PER_CHILD).abs() < 1e-9);
        assert!(heat[0].current_funding < 12.0 * 10_000.0);
        assert!(heat[0].funding_gap > 0.0);
        assert_eq!(heat[1].priority, HeatPriority::Low);
    }

    #[test]
    fn priority_thresholds() {
        assert_eq!(HeatPriority::from_density(10), HeatPriority::Low);
        assert_eq!(HeatPriority::from_density(11), HeatPriority::Medium);
        assert_eq!(HeatPriority::from_density(21), HeatPriority::High);
    }

    #[test]
    fn seeded_heatmap_is_repeatable() {
        let records = vec![child("1", "A", 3), child("2", "B", 4)];
        assert_eq!(
            district_heatmap_seeded(&records, Some(9)),
            district_heatmap_seeded(&records, Some(9))
        );
        assert!(district_heatmap_seeded(&[], None).is_empty());
    }
}
