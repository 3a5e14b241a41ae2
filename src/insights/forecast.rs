use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::insights::ForecastProvider;
use crate::records::ChildRecord;

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
/// School enrolment pushes need up in the first half of the year.
pub const FIRST_HALF_FACTOR: f64 = 1.2;
pub const SECOND_HALF_FACTOR: f64 = 0.8;
pub const FUNDED_SHARE: f64 = 0.7;
pub const OBSERVED_GAP_SHARE: f64 = 0.3;
pub const PROJECTED_GAP_SHARE: f64 = 0.4;
pub const NEED_NOISE: f64 = 10_000.0;
pub const FUNDING_NOISE: f64 = 5_000.0;
pub const GROWTH_RATE_PCT: u32 = 18;

const REGIONS: [(&str, f64, f64, u32); 5] = [
    ("Urban Mumbai", 125_000.0, 85_000.0, 45),
    ("Rural Maharashtra", 180_000.0, 95_000.0, 78),
    ("Delhi NCR", 95_000.0, 70_000.0, 32),
    ("Bangalore Urban", 110_000.0, 82_000.0, 38),
    ("Chennai Metro", 88_000.0, 65_000.0, 29),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyForecast {
    pub month: String,
    pub forecast_need: f64,
    /// Only months up to the current one have "observed" values.
    pub current_need: Option<f64>,
    pub actual_funding: Option<f64>,
    pub gap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalNeed {
    pub region: String,
    pub need: f64,
    pub funded: f64,
    pub gap: f64,
    pub children: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundingForecast {
    pub months: Vec<MonthlyForecast>,
    pub regions: Vec<RegionalNeed>,
    pub projected_annual_need: f64,
    pub total_gap: f64,
    /// Static year-over-year figure.
    pub growth_rate_pct: u32,
    pub simulated: bool,
}

pub struct SeasonalForecastProvider {
    seed: Option<u64>,
    base_need: f64,
    monthly_growth: f64,
    current_month: Option<u32>,
}

impl SeasonalForecastProvider {
    pub fn new(seed: Option<u64>) -> Self {
        let defaults = ForecastConfig::default();
        Self {
            seed,
            base_need: defaults.base_need,
            monthly_growth: defaults.monthly_growth,
            current_month: None,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            seed: config.seed,
            base_need: config.base_need,
            monthly_growth: config.monthly_growth,
            current_month: None,
        }
    }

    /// Pins "now" to a zero-based month instead of reading the clock.
    pub fn with_current_month(mut self, month0: u32) -> Self {
        self.current_month = Some(month0.min(11));
        self
    }

    pub fn forecast_need(&self, month0: usize) -> f64 {
        let base = self.base_need + self.monthly_growth * month0 as f64;
        let factor = if month0 < 6 {
            FIRST_HALF_FACTOR
        } else {
            SECOND_HALF_FACTOR
        };
        base * factor
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl ForecastProvider for SeasonalForecastProvider {
    fn name(&self) -> &str {
        "seasonal"
    }

    fn forecast(&self, _records: &[ChildRecord]) -> FundingForecast {
        let current = self
            .current_month
            .unwrap_or_else(|| Utc::now().month0()) as usize;
        let mut rng = self.rng();

        let months = MONTHS
            .iter()
            .enumerate()
            .map(|(index, month)| {
                let need = self.forecast_need(index);
                let observed = index <= current;
                let (current_need, actual_funding, gap) = if observed {
                    (
                        Some(need + rng.random_range(0.0..NEED_NOISE)),
                        Some(need * FUNDED_SHARE + rng.random_range(0.0..FUNDING_NOISE)),
                        need * OBSERVED_GAP_SHARE,
                    )
                } else {
                    (None, None, need * PROJECTED_GAP_SHARE)
                };
                MonthlyForecast {
                    month: month.to_string(),
                    forecast_need: need,
                    current_need,
                    actual_funding,
                    gap,
                }
            })
            .collect::<Vec<_>>();

        FundingForecast {
            projected_annual_need: months.iter().map(|m| m.forecast_need).sum(),
            total_gap: months.iter().map(|m| m.gap).sum(),
            months,
            regions: regional_needs(),
            growth_rate_pct: GROWTH_RATE_PCT,
            simulated: true,
        }
    }
}

pub fn regional_needs() -> Vec<RegionalNeed> {
    REGIONS
        .iter()
        .map(|(region, need, funded, children)| RegionalNeed {
            region: region.to_string(),
            need: *need,
            funded: *funded,
            gap: need - funded,
            children: *children,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{regional_needs, SeasonalForecastProvider, FUNDING_NOISE, NEED_NOISE};
    use crate::insights::ForecastProvider;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn fixed_seed_is_repeatable() {
        let provider = SeasonalForecastProvider::new(Some(7)).with_current_month(4);
        assert_eq!(provider.forecast(&[]), provider.forecast(&[]));
    }

    #[test]
    fn totals_follow_the_seasonal_formula() {
        let forecast = SeasonalForecastProvider::new(Some(1))
            .with_current_month(2)
            .forecast(&[]);
        assert_eq!(forecast.months.len(), 12);
        assert!(close(forecast.months[0].forecast_need, 60_000.0));
        assert!(close(forecast.months[6].forecast_need, 49_600.0));
        assert!(close(forecast.projected_annual_need, 717_600.0));
        assert!(close(forecast.total_gap, 268_320.0));
        assert_eq!(forecast.growth_rate_pct, 18);
    }

    #[test]
    fn only_past_months_carry_observations() {
        let forecast = SeasonalForecastProvider::new(Some(11))
            .with_current_month(2)
            .forecast(&[]);
        for (index, month) in forecast.months.iter().enumerate() {
            if index <= 2 {
                let current = month.current_need.expect("observed need");
                let funding = month.actual_funding.expect("observed funding");
                assert!(current >= month.forecast_need);
                assert!(current < month.forecast_need + NEED_NOISE);
                assert!(funding >= month.forecast_need * 0.7);
                assert!(funding < month.forecast_need * 0.7 + FUNDING_NOISE);
            } else {
                assert!(month.current_need.is_none());
                assert!(month.actual_funding.is_none());
            }
        }
    }

    #[test]
    fn regional_gaps_are_need_minus_funded() {
        let regions = regional_needs();
        assert_eq!(regions.len(), 5);
        assert_eq!(regions[1].region, "Rural Maharashtra");
        assert!(close(regions[1].gap, 85_000.0));
        assert_eq!(regions.iter().map(|r| r.children).sum::<u32>(), 222);
    }
}
