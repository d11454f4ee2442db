//! Typed access to the console's collections.

use std::sync::Arc;

use dishpatch_services::DocumentStore;
use serde::de::DeserializeOwned;

use crate::live::LiveQuery;
use crate::model::{Driver, MenuCategory, MenuItem, Order, Promotion, Review, User};

/// Collection paths as they exist in the store. `MENU_CATEGORIES`
/// really is snake_case upstream while `MENU_ITEMS` is camelCase.
pub mod collections {
    pub const USERS: &str = "users";
    pub const DRIVERS: &str = "drivers";
    pub const ORDERS: &str = "orders";
    pub const MENU_ITEMS: &str = "menuItems";
    pub const MENU_CATEGORIES: &str = "menu_categories";
    pub const PROMOTIONS: &str = "promotions";
    pub const REVIEWS: &str = "reviews";
}

/// Path of the document `id` inside `collection`.
pub fn document_path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

/// Facade vending typed live queries. Cheaply cloneable.
#[derive(Clone)]
pub struct Console {
    store: Arc<dyn DocumentStore>,
}

impl Console {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ── Collection mirrors ───────────────────────────────────────────

    pub fn users(&self) -> LiveQuery<Vec<User>> {
        self.collection(collections::USERS)
    }

    pub fn drivers(&self) -> LiveQuery<Vec<Driver>> {
        self.collection(collections::DRIVERS)
    }

    pub fn orders(&self) -> LiveQuery<Vec<Order>> {
        self.collection(collections::ORDERS)
    }

    pub fn menu_items(&self) -> LiveQuery<Vec<MenuItem>> {
        self.collection(collections::MENU_ITEMS)
    }

    pub fn menu_categories(&self) -> LiveQuery<Vec<MenuCategory>> {
        self.collection(collections::MENU_CATEGORIES)
    }

    pub fn promotions(&self) -> LiveQuery<Vec<Promotion>> {
        self.collection(collections::PROMOTIONS)
    }

    pub fn reviews(&self) -> LiveQuery<Vec<Review>> {
        self.collection(collections::REVIEWS)
    }

    // ── Document mirrors ─────────────────────────────────────────────

    pub fn user(&self, id: &str) -> LiveQuery<User> {
        self.document(&document_path(collections::USERS, id))
    }

    pub fn driver(&self, id: &str) -> LiveQuery<Driver> {
        self.document(&document_path(collections::DRIVERS, id))
    }

    pub fn order(&self, id: &str) -> LiveQuery<Order> {
        self.document(&document_path(collections::ORDERS, id))
    }

    pub fn menu_item(&self, id: &str) -> LiveQuery<MenuItem> {
        self.document(&document_path(collections::MENU_ITEMS, id))
    }

    // ── Untyped escape hatches ───────────────────────────────────────

    /// Mirror an arbitrary collection as records of `R`.
    pub fn collection<R: DeserializeOwned>(&self, path: &str) -> LiveQuery<Vec<R>> {
        LiveQuery::collection(self.store.as_ref(), path)
    }

    /// Mirror an arbitrary document as a `T`.
    pub fn document<T: DeserializeOwned>(&self, path: &str) -> LiveQuery<T> {
        LiveQuery::document(self.store.as_ref(), path)
    }
}
