pub mod csv;
pub mod document;
pub mod table;

use anyhow::Result;
use serde::Serialize;

pub use document::ImpactDocument;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Whole rupees, no grouping: `₹150000`.
pub fn format_inr(amount: f64) -> String {
    format!("₹{amount:.0}")
}

/// `₹150K`
pub fn format_thousands(amount: f64) -> String {
    format!("₹{:.0}K", amount / 1_000.0)
}

/// Indian lakh notation, one decimal: `₹2.9L`.
pub fn format_lakh(amount: f64) -> String {
    format!("₹{:.1}L", amount / 100_000.0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{format_inr, format_lakh, format_thousands, render_json};

    #[test]
    fn money_formats() {
        assert_eq!(format_inr(150_000.0), "₹150000");
        assert_eq!(format_thousands(85_000.0), "₹85K");
        assert_eq!(format_lakh(250_000.0), "₹2.5L");
    }

    #[test]
    fn json_is_pretty() {
        let rendered = render_json(&json!({ "a": 1 })).expect("render");
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }
}
