use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::engine::aggregate::share_percent;
use crate::engine::{AggregateBucket, Aggregates, RankedChild, RiskSummary, RiskTier, SummaryStats};
use crate::insights::{
    CsrSuggestion, DistrictHeat, FundingForecast, HeatPriority, ImpactLevel, ImpactReport,
};
use crate::records::{ChildRecord, Donation, SuccessStory};
use crate::report::{format_inr, format_lakh, format_thousands};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn dash() -> String {
    "-".to_string()
}

pub fn render_children_table(records: &[ChildRecord]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        "Name",
        "Age",
        "Gender",
        "District",
        "Location",
        "Education",
        "Health",
        "Guardian",
        "Verified",
    ]);
    for child in records {
        table.add_row(vec![
            child.name.clone(),
            child.age.to_string(),
            child.gender.to_string(),
            child.district.clone(),
            child.location.clone(),
            child.education_status.to_string(),
            child.health_status.to_string(),
            child.guardian_name.clone().filter(|g| !g.is_empty()).unwrap_or_else(dash),
            if child.verified { "yes" } else { "no" }.to_string(),
        ]);
    }
    format!("{table}\nShowing {} children", records.len())
}

pub fn render_summary_table(stats: &SummaryStats) -> String {
    let mut table = base_table();
    table.set_header(vec!["Metric", "Count", "Share"]);
    table.add_row(vec![
        "Total children".to_string(),
        stats.total_children.to_string(),
        "100.0%".to_string(),
    ]);
    table.add_row(vec![
        "Receiving education".to_string(),
        stats.educated_children.to_string(),
        format!("{:.1}%", stats.educated_pct),
    ]);
    table.add_row(vec![
        "Good or excellent health".to_string(),
        stats.healthy_children.to_string(),
        format!("{:.1}%", stats.healthy_pct),
    ]);
    table.add_row(vec![
        "Verified".to_string(),
        stats.verified_children.to_string(),
        format!("{:.1}%", stats.verified_pct),
    ]);
    table.add_row(vec![
        "Impact growth (placeholder)".to_string(),
        dash(),
        format!("+{}%", stats.impact_growth_pct),
    ]);
    table.to_string()
}

fn render_bucket_table(title: &str, buckets: &[AggregateBucket], total: usize) -> String {
    let mut table = base_table();
    table.set_header(vec![title, "Count", "Share"]);
    for bucket in buckets {
        table.add_row(vec![
            bucket.label.clone(),
            bucket.count.to_string(),
            format!("{:.1}%", share_percent(bucket.count, total)),
        ]);
    }
    table.to_string()
}

pub fn render_aggregates_table(aggregates: &Aggregates) -> String {
    let total = aggregates.by_gender.iter().map(|b| b.count).sum();
    [
        render_bucket_table("District", &aggregates.by_district, total),
        render_bucket_table("Education", &aggregates.by_education, total),
        render_bucket_table("Gender", &aggregates.by_gender, total),
        render_bucket_table("Age", &aggregates.by_age_bracket, total),
    ]
    .join("\n")
}

fn tier_cell(tier: RiskTier) -> Cell {
    let cell = Cell::new(tier.to_string().to_uppercase());
    match tier {
        RiskTier::High => cell.fg(Color::Red),
        RiskTier::Medium => cell.fg(Color::Yellow),
        RiskTier::Low => cell.fg(Color::Green),
    }
}

pub fn render_risk_table(ranked: &[RankedChild], summary: &RiskSummary) -> String {
    let mut table = base_table();
    table.set_header(vec![
        "Rank",
        "Name",
        "Age",
        "District",
        "Education",
        "Health",
        "Score",
        "Tier",
    ]);
    for (idx, item) in ranked.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new((idx + 1).to_string()),
            Cell::new(&item.child.name),
            Cell::new(item.child.age.to_string()),
            Cell::new(&item.child.district),
            Cell::new(item.child.education_status.to_string()),
            Cell::new(item.child.health_status.to_string()),
            Cell::new(format!("{}%", item.score)),
            tier_cell(item.tier),
        ]));
    }
    format!(
        "{table}\nHigh risk: {}  Medium risk: {}  Low risk: {}",
        summary.high, summary.medium, summary.low
    )
}

pub fn render_heatmap_table(rows: &[DistrictHeat]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        "District",
        "Children",
        "Verified",
        "Locations",
        "Need",
        "Funded",
        "Gap",
        "Priority",
    ]);
    for row in rows {
        let priority = Cell::new(row.priority.as_str().to_uppercase());
        let priority = match row.priority {
            HeatPriority::High => priority.fg(Color::Red),
            HeatPriority::Medium => priority.fg(Color::Yellow),
            HeatPriority::Low => priority,
        };
        table.add_row(Row::from(vec![
            Cell::new(&row.district),
            Cell::new(row.density.to_string()),
            Cell::new(row.verified.to_string()),
            Cell::new(row.locations.to_string()),
            Cell::new(format_thousands(row.funding_need)),
            Cell::new(format_thousands(row.current_funding)),
            Cell::new(format_thousands(row.funding_gap)),
            priority,
        ]));
    }
    format!("{table}\nFunding figures are simulated.")
}

pub fn render_forecast_table(forecast: &FundingForecast) -> String {
    let mut months = base_table();
    months.set_header(vec!["Month", "Projected Need", "Current Need", "Funding", "Gap"]);
    for month in &forecast.months {
        months.add_row(vec![
            month.month.clone(),
            format_thousands(month.forecast_need),
            month.current_need.map(format_thousands).unwrap_or_else(dash),
            month.actual_funding.map(format_thousands).unwrap_or_else(dash),
            format_thousands(month.gap),
        ]);
    }

    let mut regions = base_table();
    regions.set_header(vec!["Region", "Children", "Need", "Funded", "Gap"]);
    for region in &forecast.regions {
        regions.add_row(vec![
            region.region.clone(),
            region.children.to_string(),
            format_thousands(region.need),
            format_thousands(region.funded),
            format_thousands(region.gap),
        ]);
    }

    format!(
        "{months}\n{regions}\nProjected annual need: {}  Funding gap: {}  Growth: +{}% (simulated)",
        format_lakh(forecast.projected_annual_need),
        format_lakh(forecast.total_gap),
        forecast.growth_rate_pct
    )
}

pub fn render_suggestions_table(organization: &str, items: &[CsrSuggestion]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        "#",
        "Recommendation",
        "Category",
        "Impact",
        "Urgency",
        "Children",
        "Est. Cost",
        "Why",
    ]);
    for item in items {
        let impact = Cell::new(item.impact.label());
        let impact = if item.impact == ImpactLevel::High {
            impact.fg(Color::Red)
        } else {
            impact
        };
        table.add_row(Row::from(vec![
            Cell::new(item.id.to_string()),
            Cell::new(format!("{}\n{}", item.title, item.description)),
            Cell::new(&item.category),
            impact,
            Cell::new(item.urgency.label()),
            Cell::new(item.children.to_string()),
            Cell::new(format_thousands(item.estimated_cost)),
            Cell::new(item.reasons.join("\n")),
        ]));
    }
    format!("Recommendations for {organization}\n{table}")
}

pub fn render_contributions_table(report: &ImpactReport) -> String {
    let mut table = base_table();
    table.set_header(vec!["Date", "Project", "Amount", "Children", "Status"]);
    for contribution in &report.contributions {
        table.add_row(vec![
            contribution.date.clone(),
            contribution.project.clone(),
            format_inr(contribution.amount),
            contribution.children_helped.to_string(),
            contribution.status.label().to_string(),
        ]);
    }
    format!(
        "{table}\nTotal: {}  Children helped: {}  Projects: {}  Regions: {}\nSuccess rate: {}%  Completion rate: {}%",
        format_lakh(report.total_donated),
        report.children_helped,
        report.projects_supported,
        report.regions.join(", "),
        report.executive_summary.success_rate,
        report.executive_summary.completion_rate
    )
}

pub fn render_stories_table(stories: &[SuccessStory]) -> String {
    let mut table = base_table();
    table.set_header(vec!["Title", "Child", "Story", "Published"]);
    for story in stories {
        let child = story
            .child
            .as_ref()
            .map(|c| format!("{}, {} years", c.name, c.age))
            .unwrap_or_else(dash);
        table.add_row(vec![
            story.title.clone(),
            child,
            story.description.clone(),
            story
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(dash),
        ]);
    }
    table.to_string()
}

pub fn render_donations_table(donations: &[Donation]) -> String {
    let mut table = base_table();
    table.set_header(vec!["Date", "Amount", "Purpose", "Children", "Status"]);
    for donation in donations {
        table.add_row(vec![
            donation
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(dash),
            format!("{} {}", format_inr(donation.amount), donation.currency),
            donation.purpose.clone(),
            donation
                .beneficiary_children_count
                .map(|c| c.to_string())
                .unwrap_or_else(dash),
            donation.status.clone(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::{render_children_table, render_risk_table, render_summary_table};
    use crate::engine::tests::child;
    use crate::engine::{summarize, summarize_risk, RiskModel};

    #[test]
    fn children_table_shows_rows_and_count() {
        let rendered = render_children_table(&[child("1", "Asha", 8), child("2", "Ravi", 11)]);
        assert!(rendered.contains("Asha"));
        assert!(rendered.contains("Secondary"));
        assert!(rendered.ends_with("Showing 2 children"));
    }

    #[test]
    fn risk_table_includes_tier_summary() {
        let ranked = RiskModel::default().rank(&[child("1", "Asha", 17)]);
        let rendered = render_risk_table(&ranked, &summarize_risk(&ranked));
        assert!(rendered.contains("30%"));
        assert!(rendered.contains("Low risk: 1"));
    }

    #[test]
    fn summary_marks_growth_as_placeholder() {
        let rendered = render_summary_table(&summarize(&[child("1", "Asha", 8)]));
        assert!(rendered.contains("placeholder"));
        assert!(rendered.contains("+24%"));
    }
}
