//! Heuristic dropout-risk scoring.
//!
//! Scores are additive rule weights clamped to 100. Age, education and health each
//! contribute at most one rule; guardian and district rules are independent.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::records::{ChildRecord, EducationStatus, HealthStatus};

pub const MAX_RISK_SCORE: u8 = 100;
pub const HIGH_TIER_THRESHOLD: u8 = 70;
pub const MEDIUM_TIER_THRESHOLD: u8 = 40;
pub const DEFAULT_HIGH_RISK_DISTRICTS: [&str; 2] = ["Rural District A", "Mountain Region"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_TIER_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_TIER_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl Display for RiskTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    AgeOverSixteen,
    AgeOverFourteen,
    AgeUnderSix,
    NoEducation,
    PrimaryEducationOnly,
    PoorOrCriticalHealth,
    FairHealth,
    NoGuardian,
    HighRiskDistrict,
}

impl RiskRule {
    pub fn weight(self) -> u8 {
        match self {
            Self::AgeOverSixteen => 30,
            Self::AgeOverFourteen => 20,
            Self::AgeUnderSix => 10,
            Self::NoEducation => 40,
            Self::PrimaryEducationOnly => 25,
            Self::PoorOrCriticalHealth => 25,
            Self::FairHealth => 15,
            Self::NoGuardian => 20,
            Self::HighRiskDistrict => 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskScore {
    pub child_id: String,
    pub score: u8,
    pub tier: RiskTier,
    pub factors: Vec<RiskRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedChild {
    pub child: ChildRecord,
    pub score: u8,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskModel {
    high_risk_districts: Vec<String>,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_RISK_DISTRICTS.iter().map(|d| d.to_string()))
    }
}

impl RiskModel {
    pub fn new(high_risk_districts: impl IntoIterator<Item = String>) -> Self {
        Self {
            high_risk_districts: high_risk_districts.into_iter().collect(),
        }
    }

    pub fn high_risk_districts(&self) -> &[String] {
        &self.high_risk_districts
    }

    /// Rules that fire for this child, in evaluation order.
    pub fn explain(&self, child: &ChildRecord) -> Vec<RiskRule> {
        let mut fired = Vec::with_capacity(5);

        if child.age > 16 {
            fired.push(RiskRule::AgeOverSixteen);
        } else if child.age > 14 {
            fired.push(RiskRule::AgeOverFourteen);
        } else if child.age < 6 {
            fired.push(RiskRule::AgeUnderSix);
        }

        match child.education_status {
            EducationStatus::None => fired.push(RiskRule::NoEducation),
            EducationStatus::Primary => fired.push(RiskRule::PrimaryEducationOnly),
            _ => {}
        }

        match child.health_status {
            HealthStatus::Poor | HealthStatus::Critical => {
                fired.push(RiskRule::PoorOrCriticalHealth)
            }
            HealthStatus::Fair => fired.push(RiskRule::FairHealth),
            _ => {}
        }

        if !child.has_guardian() {
            fired.push(RiskRule::NoGuardian);
        }

        if self.high_risk_districts.iter().any(|d| *d == child.district) {
            fired.push(RiskRule::HighRiskDistrict);
        }

        fired
    }

    pub fn score(&self, child: &ChildRecord) -> u8 {
        score_from_rules(&self.explain(child))
    }

    pub fn assess(&self, child: &ChildRecord) -> RiskScore {
        let factors = self.explain(child);
        let score = score_from_rules(&factors);
        RiskScore {
            child_id: child.id.clone(),
            score,
            tier: RiskTier::from_score(score),
            factors,
        }
    }

    /// Highest score first; equal scores keep their input order.
    pub fn rank(&self, records: &[ChildRecord]) -> Vec<RankedChild> {
        let mut ranked = records
            .iter()
            .map(|child| {
                let score = self.score(child);
                RankedChild {
                    child: child.clone(),
                    score,
                    tier: RiskTier::from_score(score),
                }
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}

pub fn summarize_risk(ranked: &[RankedChild]) -> RiskSummary {
    let mut summary = RiskSummary::default();
    for item in ranked {
        match item.tier {
            RiskTier::High => summary.high += 1,
            RiskTier::Medium => summary.medium += 1,
            RiskTier::Low => summary.low += 1,
        }
    }
    summary
}

fn score_from_rules(rules: &[RiskRule]) -> u8 {
    let total: u32 = rules.iter().map(|rule| u32::from(rule.weight())).sum();
    total.min(u32::from(MAX_RISK_SCORE)) as u8
}
