use anyhow::Result;

use crate::engine::RankedChild;
use crate::insights::ImpactReport;
use crate::records::ChildRecord;
use crate::report::format_inr;

pub const CHILDREN_CSV_FILENAME: &str = "children_data.csv";
pub const CHILDREN_CSV_HEADER: &str = "Name,Age,Gender,District,Location,Education,Health";

/// Plain comma join. Values are written as-is, so a comma inside a name or location
/// shifts the columns of that line.
pub fn children_to_csv(records: &[ChildRecord]) -> String {
    let rows = records
        .iter()
        .map(|child| {
            [
                child.name.as_str(),
                &child.age.to_string(),
                child.gender.as_str(),
                child.district.as_str(),
                child.location.as_str(),
                child.education_status.as_str(),
                child.health_status.as_str(),
            ]
            .join(",")
        })
        .collect::<Vec<_>>();
    format!("{CHILDREN_CSV_HEADER}\n{}", rows.join("\n"))
}

pub fn risk_to_csv(ranked: &[RankedChild]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["rank", "id", "name", "age", "district", "score", "tier"])?;
    for (idx, item) in ranked.iter().enumerate() {
        writer.write_record([
            (idx + 1).to_string(),
            item.child.id.clone(),
            item.child.name.clone(),
            item.child.age.to_string(),
            item.child.district.clone(),
            item.score.to_string(),
            item.tier.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn contributions_to_csv(report: &ImpactReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "Project",
        "Amount",
        "Children Helped",
        "Status",
        "Completion Date",
    ])?;
    for contribution in &report.contributions {
        writer.write_record([
            contribution.project.clone(),
            format_inr(contribution.amount),
            contribution.children_helped.to_string(),
            contribution.status.label().to_string(),
            contribution.date.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
