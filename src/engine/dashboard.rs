use serde::Serialize;

use crate::engine::aggregate::{aggregate, summarize, Aggregates, SummaryStats};
use crate::engine::filter::{filter_children, FilterDimension, FilterSpec};
use crate::engine::risk::{summarize_risk, RankedChild, RiskModel, RiskSummary};
use crate::records::{ChildRecord, RecordSnapshot};

/// State owned by the presentation layer. Mutations replace the snapshot or the filter
/// selection; every read goes through [`DashboardState::view`], which recomputes from scratch.
#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: RecordSnapshot,
    filters: FilterSpec,
    risk_model: RiskModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub fingerprint: String,
    pub filters: FilterSpec,
    /// Headline numbers always cover the whole snapshot, not the filtered subset.
    pub summary: SummaryStats,
    pub filtered: Vec<ChildRecord>,
    pub aggregates: Aggregates,
    pub ranked: Vec<RankedChild>,
    pub risk_summary: RiskSummary,
}

impl DashboardState {
    pub fn new(snapshot: RecordSnapshot, risk_model: RiskModel) -> Self {
        Self {
            snapshot,
            filters: FilterSpec::match_all(),
            risk_model,
        }
    }

    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }

    pub fn set_filter(&mut self, dimension: FilterDimension, value: impl Into<String>) {
        self.filters.set(dimension, value);
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterSpec::match_all();
    }

    pub fn replace_snapshot(&mut self, snapshot: RecordSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &RecordSnapshot {
        &self.snapshot
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn risk_model(&self) -> &RiskModel {
        &self.risk_model
    }

    pub fn filtered(&self) -> Vec<ChildRecord> {
        filter_children(self.snapshot.children(), &self.filters)
    }

    pub fn view(&self) -> DashboardView {
        let filtered = self.filtered();
        let aggregates = aggregate(&filtered);
        let ranked = self.risk_model.rank(&filtered);
        let risk_summary = summarize_risk(&ranked);
        DashboardView {
            fingerprint: self.snapshot.fingerprint().to_string(),
            filters: self.filters.clone(),
            summary: summarize(self.snapshot.children()),
            filtered,
            aggregates,
            ranked,
            risk_summary,
        }
    }
}
