use serde::{Deserialize, Serialize};

/// Static figures shown on every impact report until outcome tracking is wired to real data.
pub const SUCCESS_RATE_PCT: u32 = 94;
pub const COMPLETION_RATE_PCT: u32 = 87;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Completed,
    InProgress,
}

impl ContributionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactMetric {
    pub name: String,
    pub before: u32,
    pub after: u32,
}

impl ImpactMetric {
    fn new(name: &str, before: u32, after: u32) -> Self {
        Self {
            name: name.to_string(),
            before,
            after,
        }
    }

    pub fn improvement(&self) -> i64 {
        i64::from(self.after) - i64::from(self.before)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contribution {
    pub id: u32,
    /// ISO date the contribution was made.
    pub date: String,
    pub amount: f64,
    pub project: String,
    pub children_helped: u32,
    pub status: ContributionStatus,
    pub outcomes: Vec<String>,
    pub metrics: Vec<ImpactMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionLedger {
    pub contributions: Vec<Contribution>,
    pub projects_supported: u32,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutiveSummary {
    pub total_impact: u32,
    pub success_rate: u32,
    pub completion_rate: u32,
    pub regional_coverage: usize,
}

/// Percent of spend per programme area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialBreakdown {
    pub education: u32,
    pub healthcare: u32,
    pub documentation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactReport {
    pub organization: String,
    pub year: i32,
    pub total_donated: f64,
    pub children_helped: u32,
    pub projects_supported: u32,
    pub regions: Vec<String>,
    pub executive_summary: ExecutiveSummary,
    pub key_achievements: Vec<String>,
    pub financial_breakdown: FinancialBreakdown,
    pub contributions: Vec<Contribution>,
    pub simulated: bool,
}

impl ContributionLedger {
    pub fn total_donated(&self) -> f64 {
        self.contributions.iter().map(|c| c.amount).sum()
    }

    pub fn children_helped(&self) -> u32 {
        self.contributions.iter().map(|c| c.children_helped).sum()
    }

    /// The demonstration ledger every organisation sees until its own history is tracked.
    pub fn sample() -> Self {
        Self {
            contributions: vec![
                Contribution {
                    id: 1,
                    date: "2024-01-15".to_string(),
                    amount: 150_000.0,
                    project: "Education Support - Mumbai".to_string(),
                    children_helped: 42,
                    status: ContributionStatus::Completed,
                    outcomes: lines(&[
                        "School enrollment completed for 42 children",
                        "Educational materials provided (books, uniforms)",
                        "Teacher training program conducted",
                        "Digital learning setup in 3 schools",
                    ]),
                    metrics: vec![
                        ImpactMetric::new("School Enrollment", 0, 42),
                        ImpactMetric::new("Literacy Rate", 0, 85),
                        ImpactMetric::new("Attendance", 0, 92),
                    ],
                },
                Contribution {
                    id: 2,
                    date: "2024-02-10".to_string(),
                    amount: 85_000.0,
                    project: "Healthcare Initiative - Pune".to_string(),
                    children_helped: 18,
                    status: ContributionStatus::InProgress,
                    outcomes: lines(&[
                        "Medical checkups completed for 18 children",
                        "Vaccination drive conducted",
                        "Nutrition supplements provided",
                        "Health awareness sessions held",
                    ]),
                    metrics: vec![
                        ImpactMetric::new("Health Improvement", 45, 89),
                        ImpactMetric::new("Vaccination", 60, 100),
                        ImpactMetric::new("Nutrition", 30, 85),
                    ],
                },
                Contribution {
                    id: 3,
                    date: "2024-03-05".to_string(),
                    amount: 50_000.0,
                    project: "Identity Documentation - Delhi".to_string(),
                    children_helped: 7,
                    status: ContributionStatus::Completed,
                    outcomes: lines(&[
                        "Aadhaar cards obtained for 7 children",
                        "Birth certificates processed",
                        "School admission facilitated",
                        "Government scheme enrollment",
                    ]),
                    metrics: vec![
                        ImpactMetric::new("Documentation", 0, 100),
                        ImpactMetric::new("School Admission", 0, 100),
                        ImpactMetric::new("Government Benefits", 0, 85),
                    ],
                },
            ],
            projects_supported: 8,
            regions: lines(&["Mumbai", "Pune", "Delhi"]),
        }
    }
}

pub fn impact_report(ledger: &ContributionLedger, organization: &str, year: i32) -> ImpactReport {
    let children_helped = ledger.children_helped();
    ImpactReport {
        organization: organization.to_string(),
        year,
        total_donated: ledger.total_donated(),
        children_helped,
        projects_supported: ledger.projects_supported,
        regions: ledger.regions.clone(),
        executive_summary: ExecutiveSummary {
            total_impact: children_helped,
            success_rate: SUCCESS_RATE_PCT,
            completion_rate: COMPLETION_RATE_PCT,
            regional_coverage: ledger.regions.len(),
        },
        key_achievements: lines(&[
            "Successfully enrolled 42 children in formal education",
            "Improved health metrics for 18 children by 44%",
            "Facilitated complete documentation for 7 undocumented children",
            "Established digital learning infrastructure in 3 schools",
        ]),
        financial_breakdown: FinancialBreakdown {
            education: 60,
            healthcare: 30,
            documentation: 10,
        },
        contributions: ledger.contributions.clone(),
        simulated: true,
    }
}

/// `Acme_Impact_Report_2025.csv`
pub fn report_filename(organization: &str, year: i32, extension: &str) -> String {
    let organization = organization.trim().replace(['/', '\\'], "-");
    format!("{organization}_Impact_Report_{year}.{extension}")
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{impact_report, report_filename, ContributionLedger, ContributionStatus};

    #[test]
    fn sample_totals_match_contributions() {
        let ledger = ContributionLedger::sample();
        assert!((ledger.total_donated() - 285_000.0).abs() < f64::EPSILON);
        assert_eq!(ledger.children_helped(), 67);
        assert_eq!(ledger.contributions[1].status, ContributionStatus::InProgress);
        assert_eq!(ledger.contributions[1].metrics[0].improvement(), 44);
    }

    #[test]
    fn report_carries_executive_summary() {
        let report = impact_report(&ContributionLedger::sample(), "Acme", 2025);
        assert_eq!(report.executive_summary.total_impact, 67);
        assert_eq!(report.executive_summary.success_rate, 94);
        assert_eq!(report.executive_summary.completion_rate, 87);
        assert_eq!(report.executive_summary.regional_coverage, 3);
        assert_eq!(
            report.financial_breakdown.education
                + report.financial_breakdown.healthcare
                + report.financial_breakdown.documentation,
            100
        );
    }

    #[test]
    fn filename_uses_organization_and_year() {
        assert_eq!(report_filename("Acme", 2025, "csv"), "Acme_Impact_Report_2025.csv");
        assert_eq!(report_filename("A/B", 2024, "txt"), "A-B_Impact_Report_2024.txt");
    }
}
