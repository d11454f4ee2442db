//! Promotional codes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle label shown in the promotions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum PromotionStatus {
    Active,
    Expired,
}

/// Promotion record from the `promotions` collection. `discount` is a
/// display string ("20%", "Free delivery"), not an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub code: String,
    pub description: String,
    pub discount: String,
    pub status: PromotionStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Promotion {
    /// Whether `date` falls inside the validity window.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validity_window_is_inclusive() {
        let promo: Promotion = serde_json::from_value(json!({
            "id": "p1",
            "code": "SUMMER20",
            "description": "20% off all mains",
            "discount": "20%",
            "status": "Active",
            "startDate": "2024-06-01",
            "endDate": "2024-06-30"
        }))
        .unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        assert!(promo.is_valid_on(day(1)));
        assert!(promo.is_valid_on(day(30)));
        assert!(!promo.is_valid_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }
}
