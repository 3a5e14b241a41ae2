use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PRESET_AMOUNTS: [u32; 6] = [1_000, 2_500, 5_000, 10_000, 25_000, 50_000];
pub const PURPOSE_OPTIONS: [&str; 7] = [
    "Education Support",
    "Healthcare",
    "Nutrition Programs",
    "Shelter & Safety",
    "Skill Development",
    "Emergency Relief",
    "General Support",
];
/// One child supported per this many rupees.
pub const AMOUNT_PER_CHILD: f64 = 1_000.0;
pub const DEFAULT_CURRENCY: &str = "INR";
pub const PENDING_STATUS: &str = "pending";

#[derive(Debug, Error, PartialEq)]
pub enum DonationError {
    #[error("donor id is required")]
    MissingDonor,
    #[error("donation purpose is required")]
    MissingPurpose,
    #[error("donation amount must be a positive number, got {0}")]
    InvalidAmount(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    pub donor_id: String,
    pub amount: f64,
    pub purpose: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDonation {
    pub donor_id: String,
    pub amount: f64,
    pub currency: String,
    pub purpose: String,
    pub beneficiary_children_count: Option<u32>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donation {
    pub id: String,
    pub donor_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub purpose: String,
    #[serde(default)]
    pub beneficiary_children_count: Option<u32>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl DonationRequest {
    pub fn validate(&self) -> Result<NewDonation, DonationError> {
        if self.donor_id.trim().is_empty() {
            return Err(DonationError::MissingDonor);
        }
        if self.purpose.trim().is_empty() {
            return Err(DonationError::MissingPurpose);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(DonationError::InvalidAmount(self.amount));
        }

        let purpose = match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                format!("{} - {description}", self.purpose.trim())
            }
            _ => self.purpose.trim().to_string(),
        };

        Ok(NewDonation {
            donor_id: self.donor_id.trim().to_string(),
            amount: self.amount,
            currency: DEFAULT_CURRENCY.to_string(),
            purpose,
            beneficiary_children_count: Some(estimate_beneficiaries(self.amount)),
            status: PENDING_STATUS.to_string(),
        })
    }
}

pub fn estimate_beneficiaries(amount: f64) -> u32 {
    (amount / AMOUNT_PER_CHILD).floor().max(0.0) as u32
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_status() -> String {
    PENDING_STATUS.to_string()
}
