use serde::{Deserialize, Serialize};

use crate::insights::{DonorProfile, SuggestionProvider};
use crate::records::ChildRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Moderate,
    Immediate,
    Critical,
}

impl ImpactLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Moderate => "Moderate",
            Self::Immediate => "Immediate",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsrSuggestion {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub impact: ImpactLevel,
    pub urgency: Urgency,
    pub estimated_cost: f64,
    pub children: u32,
    pub region: String,
    pub category: String,
    pub reasons: Vec<String>,
    pub expected_outcomes: Vec<String>,
}

/// Hand-curated recommendations. Neither the profile nor the records change the output yet.
pub struct CatalogSuggestionProvider;

impl SuggestionProvider for CatalogSuggestionProvider {
    fn name(&self) -> &str {
        "catalog"
    }

    fn suggest(&self, _profile: &DonorProfile, _records: &[ChildRecord]) -> Vec<CsrSuggestion> {
        catalog()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn catalog() -> Vec<CsrSuggestion> {
    vec![
        CsrSuggestion {
            id: 1,
            title: "Education Crisis in Rural Maharashtra".to_string(),
            description: "78 children without primary education need immediate intervention"
                .to_string(),
            impact: ImpactLevel::High,
            urgency: Urgency::Critical,
            estimated_cost: 180_000.0,
            children: 78,
            region: "Rural Maharashtra".to_string(),
            category: "Education".to_string(),
            reasons: strings(&[
                "Highest concentration of uneducated children",
                "Low funding coverage (53%)",
                "Matches your previous education-focused donations",
            ]),
            expected_outcomes: strings(&[
                "School enrollment for 78 children",
                "Provision of educational materials",
                "Teacher training programs",
            ]),
        },
        CsrSuggestion {
            id: 2,
            title: "Healthcare Support in Urban Mumbai".to_string(),
            description: "23 children require critical healthcare interventions".to_string(),
            impact: ImpactLevel::High,
            urgency: Urgency::Immediate,
            estimated_cost: 125_000.0,
            children: 23,
            region: "Urban Mumbai".to_string(),
            category: "Healthcare".to_string(),
            reasons: strings(&[
                "15 children in critical health condition",
                "Urban healthcare costs are rising",
                "Your organization has medical industry connections",
            ]),
            expected_outcomes: strings(&[
                "Medical treatment for critical cases",
                "Regular health checkups",
                "Vaccination programs",
            ]),
        },
        CsrSuggestion {
            id: 3,
            title: "Digital Literacy Program - Bangalore".to_string(),
            description: "Bridge the digital divide for 45 children in urban areas".to_string(),
            impact: ImpactLevel::Medium,
            urgency: Urgency::Moderate,
            estimated_cost: 95_000.0,
            children: 45,
            region: "Bangalore Urban".to_string(),
            category: "Digital Education".to_string(),
            reasons: strings(&[
                "Growing demand for digital skills",
                "Tech industry presence in Bangalore",
                "Aligns with future skill requirements",
            ]),
            expected_outcomes: strings(&[
                "Computer literacy for 45 children",
                "Digital learning resources",
                "Future job readiness",
            ]),
        },
    ]
}
