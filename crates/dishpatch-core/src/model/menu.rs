//! Menu items and categories.

use serde::{Deserialize, Serialize};

/// A priced choice attached to a menu item, used for both options and
/// add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuOption {
    pub name: String,
    pub price: f64,
}

/// Dish record from the `menuItems` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub image_url: String,
    pub data_ai_hint: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<MenuOption>,
    #[serde(default)]
    pub addons: Vec<MenuOption>,
}

impl MenuItem {
    /// Price with a chosen option and any add-ons applied.
    pub fn price_with(&self, option: Option<&MenuOption>, addons: &[&MenuOption]) -> f64 {
        let base = option.map_or(self.price, |opt| opt.price);
        base + addons.iter().map(|addon| addon.price).sum::<f64>()
    }
}

/// Category record from the `menu_categories` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_ai_hint: Option<String>,
}
