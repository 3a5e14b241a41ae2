//! Paginated plain-text impact report.
//!
//! The document is a list of sections rendered onto fixed-height pages. A section that fits
//! on the current page stays together; one that does not starts a new page, and a section
//! taller than a page is split across as many pages as it needs. Pages are separated by a
//! form feed and each starts with a `Page n/m` title line.

use crate::engine::aggregate::{bucket_total, share_percent};
use crate::engine::{AggregateBucket, Aggregates, SummaryStats};
use crate::insights::ImpactReport;
use crate::report::{format_inr, format_lakh};

pub const DEFAULT_LINES_PER_PAGE: usize = 60;
pub const MIN_LINES_PER_PAGE: usize = 8;
pub const BAR_WIDTH: usize = 30;
pub const PAGE_BREAK: char = '\u{c}';

/// Lines taken by the page title and the blank line under it.
const PAGE_HEADER_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSection {
    pub heading: String,
    pub lines: Vec<String>,
}

impl DocumentSection {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Heading, underline, body and a trailing blank line.
    fn rendered(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 3);
        out.push(self.heading.clone());
        out.push("-".repeat(self.heading.chars().count()));
        out.extend(self.lines.iter().cloned());
        out.push(String::new());
        out
    }
}

#[derive(Debug, Clone)]
pub struct ImpactDocument {
    title: String,
    lines_per_page: usize,
    sections: Vec<DocumentSection>,
}

impl ImpactDocument {
    pub fn new(title: impl Into<String>, lines_per_page: usize) -> Self {
        Self {
            title: title.into(),
            lines_per_page: lines_per_page.max(MIN_LINES_PER_PAGE),
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, section: DocumentSection) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[DocumentSection] {
        &self.sections
    }

    /// Summary numbers, one block per category, then contribution totals. Category shares
    /// are taken against the records the aggregates were built from.
    pub fn compose(
        report: &ImpactReport,
        stats: &SummaryStats,
        aggregates: &Aggregates,
        lines_per_page: usize,
    ) -> Self {
        let title = format!("{} Impact Report {}", report.organization, report.year);
        let mut document = Self::new(title, lines_per_page);

        document.push_section(
            DocumentSection::new("Summary")
                .line(format!("Total children:        {}", stats.total_children))
                .line(format!(
                    "Receiving education:   {} ({:.1}%)",
                    stats.educated_children, stats.educated_pct
                ))
                .line(format!(
                    "Good/excellent health: {} ({:.1}%)",
                    stats.healthy_children, stats.healthy_pct
                ))
                .line(format!(
                    "Verified records:      {} ({:.1}%)",
                    stats.verified_children, stats.verified_pct
                ))
                .line(format!(
                    "Impact growth:         +{}% (placeholder)",
                    stats.impact_growth_pct
                )),
        );

        let total = bucket_total(&aggregates.by_gender);
        document.push_section(bar_section("Children by District", &aggregates.by_district, total));
        document.push_section(bar_section("Education Status", &aggregates.by_education, total));
        document.push_section(bar_section("Gender Distribution", &aggregates.by_gender, total));
        document.push_section(bar_section("Age Groups", &aggregates.by_age_bracket, total));

        let summary = &report.executive_summary;
        document.push_section(
            DocumentSection::new("Executive Summary")
                .line(format!("Total contributed:  {}", format_lakh(report.total_donated)))
                .line(format!("Children helped:    {}", summary.total_impact))
                .line(format!("Projects supported: {}", report.projects_supported))
                .line(format!("Success rate:       {}%", summary.success_rate))
                .line(format!("Completion rate:    {}%", summary.completion_rate))
                .line(format!(
                    "Regional coverage:  {} ({})",
                    summary.regional_coverage,
                    report.regions.join(", ")
                )),
        );

        let mut achievements = DocumentSection::new("Key Achievements");
        for item in &report.key_achievements {
            achievements = achievements.line(format!("* {item}"));
        }
        document.push_section(achievements);

        let split = &report.financial_breakdown;
        let shares = [
            ("Education", split.education),
            ("Healthcare", split.healthcare),
            ("Documentation", split.documentation),
        ];
        let widest = shares.iter().map(|(_, pct)| *pct as usize).max().unwrap_or(0);
        let mut finance = DocumentSection::new("Financial Breakdown");
        for (label, pct) in shares {
            finance = finance.line(format!(
                "{label:<14} {:<width$} {pct:>3}%",
                bar(pct as usize, widest, BAR_WIDTH),
                width = BAR_WIDTH
            ));
        }
        document.push_section(finance);

        let mut contributions = DocumentSection::new("Contributions");
        for c in &report.contributions {
            contributions = contributions
                .line(format!(
                    "{}  {}  {}  {} children  {}",
                    c.date,
                    c.project,
                    format_inr(c.amount),
                    c.children_helped,
                    c.status.label()
                ))
                .line(format!("    {}", c.outcomes.join("; ")));
        }
        document.push_section(contributions);

        document
    }

    pub fn pages(&self) -> Vec<Vec<String>> {
        let body_height = self.lines_per_page - PAGE_HEADER_LINES;
        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for section in &self.sections {
            let lines = section.rendered();
            if !current.is_empty() && current.len() + lines.len() > body_height {
                pages.push(std::mem::take(&mut current));
            }
            for line in lines {
                if current.len() == body_height {
                    pages.push(std::mem::take(&mut current));
                }
                current.push(line);
            }
        }
        if !current.is_empty() || pages.is_empty() {
            pages.push(current);
        }

        let count = pages.len();
        pages
            .into_iter()
            .enumerate()
            .map(|(idx, body)| {
                let mut page = Vec::with_capacity(body.len() + PAGE_HEADER_LINES);
                page.push(format!("{}  Page {}/{}", self.title, idx + 1, count));
                page.push(String::new());
                page.extend(body);
                page
            })
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn render(&self) -> String {
        self.pages()
            .into_iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join(&format!("\n{PAGE_BREAK}"))
    }
}

fn bar_section(heading: &str, buckets: &[AggregateBucket], total: usize) -> DocumentSection {
    let widest = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let label_width = buckets
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);
    let mut section = DocumentSection::new(heading);
    if buckets.is_empty() {
        return section.line("(no records)");
    }
    for bucket in buckets {
        let share = share_percent(bucket.count, total);
        section = section.line(format!(
            "{:<label_width$} {:<bar_width$} {:>4} ({share:.1}%)",
            bucket.label,
            bar(bucket.count, widest, BAR_WIDTH),
            bucket.count,
            bar_width = BAR_WIDTH
        ));
    }
    section
}

/// Bar scaled to the largest value; any non-zero value gets at least one block.
pub fn bar(value: usize, max: usize, width: usize) -> String {
    if value == 0 || max == 0 {
        return String::new();
    }
    let filled = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

#[cfg(test)]
mod tests {
    use super::{bar, DocumentSection, ImpactDocument, PAGE_BREAK};
    use crate::engine::tests::child;
    use crate::engine::{aggregate, filter_children, summarize, FilterDimension, FilterSpec};
    use crate::records::Gender;
    use crate::insights::impact::{impact_report, ContributionLedger};

    #[test]
    fn bars_scale_to_the_largest_bucket() {
        assert_eq!(bar(10, 10, 30).chars().count(), 30);
        assert_eq!(bar(5, 10, 30).chars().count(), 15);
        assert_eq!(bar(1, 1000, 30).chars().count(), 1);
        assert_eq!(bar(0, 10, 30), "");
    }

    #[test]
    fn sections_do_not_straddle_pages_when_they_fit() {
        let mut document = ImpactDocument::new("Report", 10);
        for heading in ["One", "Two", "Three"] {
            document.push_section(
                DocumentSection::new(heading)
                    .line("a")
                    .line("b"),
            );
        }
        let pages = document.pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0][0], "Report  Page 1/3");
        assert_eq!(pages[1][2], "Two");
        assert!(pages.iter().all(|page| page.len() <= 10));
    }

    #[test]
    fn oversized_section_is_split() {
        let mut section = DocumentSection::new("Long");
        for i in 0..20 {
            section = section.line(format!("line {i}"));
        }
        let mut document = ImpactDocument::new("Report", 8);
        document.push_section(section);
        let pages = document.pages();
        assert_eq!(pages.len(), 4);
        assert!(pages.iter().all(|page| page.len() <= 8));
        let rendered = document.render();
        assert_eq!(rendered.matches(PAGE_BREAK).count(), 3);
        assert!(rendered.contains("Page 4/4"));
    }

    #[test]
    fn composed_report_carries_numbers() {
        let records = vec![child("1", "Asha", 4), child("2", "Ravi", 12)];
        let report = impact_report(&ContributionLedger::sample(), "Acme", 2025);
        let document =
            ImpactDocument::compose(&report, &summarize(&records), &aggregate(&records), 60);
        let rendered = document.render();
        assert!(rendered.starts_with("Acme Impact Report 2025  Page 1/"));
        assert!(rendered.contains("Total children:        2"));
        assert!(rendered.contains("Success rate:       94%"));
        assert!(rendered.contains("Education Support - Mumbai"));
        assert!(rendered.contains('█'));
        assert_eq!(document.sections().len(), 9);
    }

    #[test]
    fn filtered_shares_add_up_to_the_filtered_set() {
        let mut pune = child("1", "Asha", 4);
        pune.district = "Pune East".to_string();
        pune.gender = Gender::Female;
        let all = vec![
            pune,
            child("2", "Ravi", 12),
            child("3", "Kiran", 9),
            child("4", "Arjun", 15),
        ];
        let spec = FilterSpec::match_all().with(FilterDimension::District, "Pune East");
        let filtered = filter_children(&all, &spec);
        assert_eq!(filtered.len(), 1);

        let report = impact_report(&ContributionLedger::sample(), "Acme", 2025);
        let document =
            ImpactDocument::compose(&report, &summarize(&all), &aggregate(&filtered), 60);
        let gender = document
            .sections()
            .iter()
            .find(|section| section.heading == "Gender Distribution")
            .expect("gender section");
        assert_eq!(gender.lines.len(), 1);
        assert!(gender.lines[0].starts_with("Female"));
        assert!(gender.lines[0].ends_with("(100.0%)"));
        assert!(!document.render().contains("(25.0%)"));
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let document = ImpactDocument::new("Empty", 60);
        assert_eq!(document.page_count(), 1);
        assert_eq!(document.render(), "Empty  Page 1/1\n");
    }
}
