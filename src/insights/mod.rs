//! Forecasts, suggestions, heatmaps and impact figures shown next to the live data.
//!
//! None of this is inference. Every number here is a fixed formula, a catalogue entry or a
//! simulated draw, and each result carries `simulated = true` so callers can label it.
//! Real models plug in behind [`ForecastProvider`] and [`SuggestionProvider`].

pub mod forecast;
pub mod heatmap;
pub mod impact;
pub mod suggestions;

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::insights::forecast::SeasonalForecastProvider;
use crate::insights::suggestions::CatalogSuggestionProvider;
use crate::records::{ChildRecord, EnumParseError};

pub use forecast::{FundingForecast, MonthlyForecast, RegionalNeed};
pub use heatmap::{district_heatmap, DistrictHeat, HeatPriority};
pub use impact::{Contribution, ContributionLedger, ContributionStatus, ImpactReport};
pub use suggestions::{CsrSuggestion, ImpactLevel, Urgency};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Corporate,
    Ngo,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Admin => "admin",
            Self::Corporate => "corporate",
            Self::Ngo => "ngo",
        };
        write!(f, "{label}")
    }
}

impl FromStr for UserRole {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "corporate" => Ok(Self::Corporate),
            "ngo" => Ok(Self::Ngo),
            _ => Err(EnumParseError {
                kind: "user role",
                value: s.to_string(),
            }),
        }
    }
}

/// The signed-in organisation a suggestion or impact report is produced for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonorProfile {
    pub id: String,
    pub organization_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl DonorProfile {
    pub fn new(id: impl Into<String>, organization_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            organization_name: organization_name.into(),
            role: UserRole::default(),
        }
    }
}

pub trait ForecastProvider: Send + Sync {
    fn name(&self) -> &str;
    fn forecast(&self, records: &[ChildRecord]) -> FundingForecast;
}

pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn suggest(&self, profile: &DonorProfile, records: &[ChildRecord]) -> Vec<CsrSuggestion>;
}

#[derive(Clone)]
pub struct InsightProviders {
    forecast: Arc<dyn ForecastProvider>,
    suggestions: Arc<dyn SuggestionProvider>,
}

impl InsightProviders {
    pub fn new(
        forecast: Arc<dyn ForecastProvider>,
        suggestions: Arc<dyn SuggestionProvider>,
    ) -> Self {
        Self {
            forecast,
            suggestions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SeasonalForecastProvider::from_config(&config.forecast)),
            Arc::new(CatalogSuggestionProvider),
        )
    }

    pub fn forecast(&self) -> &dyn ForecastProvider {
        self.forecast.as_ref()
    }

    pub fn suggestions(&self) -> &dyn SuggestionProvider {
        self.suggestions.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{InsightProviders, UserRole};
    use crate::config::Config;

    #[test]
    fn default_providers_are_the_labelled_stubs() {
        let mut config = Config::default();
        config.forecast.seed = Some(3);
        let providers = InsightProviders::from_config(&config);
        assert_eq!(providers.forecast().name(), "seasonal");
        assert_eq!(providers.suggestions().name(), "catalog");
        assert!(providers.forecast().forecast(&[]).simulated);
    }

    #[test]
    fn parses_roles() {
        assert_eq!(UserRole::from_str("NGO").expect("role"), UserRole::Ngo);
        assert!(UserRole::from_str("volunteer").is_err());
    }
}
