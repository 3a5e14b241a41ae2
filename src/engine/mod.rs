pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod risk;

pub use aggregate::{aggregate, summarize, AggregateBucket, Aggregates, SummaryStats};
pub use dashboard::{DashboardState, DashboardView};
pub use filter::{filter_children, AgeBracket, FilterDimension, FilterSpec};
pub use risk::{summarize_risk, RankedChild, RiskModel, RiskScore, RiskSummary, RiskTier};
