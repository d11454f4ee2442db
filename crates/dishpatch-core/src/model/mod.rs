//! Typed records for the console's collections.
//!
//! Field names serialize in the store's camelCase convention; enum
//! labels match the strings the tables render.

mod driver;
mod menu;
mod order;
mod promotion;
mod review;
mod user;

pub use driver::{Driver, DriverAvailability, DriverStatus};
pub use menu::{MenuCategory, MenuItem, MenuOption};
pub use order::{Order, OrderItem, OrderParty, OrderStatus};
pub use promotion::{Promotion, PromotionStatus};
pub use review::Review;
pub use user::{User, UserStatus};
