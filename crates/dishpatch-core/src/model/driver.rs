//! Delivery drivers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Onboarding verdict for a driver application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum DriverStatus {
    Approved,
    Pending,
    Rejected,
}

/// Live duty state of an approved driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum DriverAvailability {
    Online,
    Offline,
    Busy,
}

/// Driver record from the `drivers` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub data_ai_hint: String,
    pub phone: String,
    pub vehicle: String,
    pub date_joined: NaiveDate,
    pub status: DriverStatus,
    pub availability: DriverAvailability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_assignment: Option<String>,
}

impl Driver {
    /// Whether the driver can take a new assignment.
    pub fn can_deliver(&self) -> bool {
        self.status == DriverStatus::Approved
            && self.availability == DriverAvailability::Online
            && self.current_assignment.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(availability: &str, assignment: Option<&str>) -> Driver {
        let mut value = json!({
            "id": "d1",
            "name": "Noor Haddad",
            "email": "noor@example.com",
            "avatarUrl": "https://img.example.com/noor.png",
            "dataAiHint": "portrait courier",
            "phone": "+31 6 1234 5678",
            "vehicle": "Scooter",
            "dateJoined": "2023-08-02",
            "status": "Approved",
            "availability": availability,
        });
        if let Some(order) = assignment {
            value["currentAssignment"] = json!(order);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn assignment_field_is_optional() {
        assert_eq!(fixture("Online", None).current_assignment, None);
        assert_eq!(
            fixture("Busy", Some("ord-42")).current_assignment.as_deref(),
            Some("ord-42")
        );
    }

    #[test]
    fn only_idle_online_approved_drivers_can_deliver() {
        assert!(fixture("Online", None).can_deliver());
        assert!(!fixture("Offline", None).can_deliver());
        assert!(!fixture("Online", Some("ord-42")).can_deliver());
    }
}
