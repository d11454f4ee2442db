//! Customer reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review record from the `reviews` collection. Ratings run 1 to 5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub customer_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_store_fields() {
        let review: Review = serde_json::from_value(json!({
            "id": "r1",
            "customerName": "Ada Lovelace",
            "rating": 5,
            "comment": "Shakshuka arrived hot, would order again.",
            "date": "2024-05-12T20:05:00Z"
        }))
        .unwrap();

        assert_eq!(review.rating, 5);
        assert_eq!(review.customer_name, "Ada Lovelace");
    }
}
