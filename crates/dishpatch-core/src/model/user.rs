//! Customer accounts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account standing shown in the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum UserStatus {
    Active,
    Blocked,
}

/// Customer record from the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub data_ai_hint: String,
    pub date_joined: NaiveDate,
    pub last_order: NaiveDate,
    pub status: UserStatus,
    pub address: String,
    pub favorites: u32,
    pub promo_codes: u32,
    pub support_tickets: u32,
    pub activity_summary: String,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }
}
