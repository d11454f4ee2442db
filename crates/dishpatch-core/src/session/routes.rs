//! Console route table.

/// Sign-in screen. The only route reachable without a session.
pub const LOGIN: &str = "/login";

/// Default destination for signed-in sessions.
pub const LANDING: &str = "/dashboard";

pub const DASHBOARD: &str = "/dashboard";
pub const MENU: &str = "/menu";
pub const ORDERS: &str = "/orders";
pub const USERS: &str = "/users";
pub const DRIVERS: &str = "/drivers";
pub const PROMOTIONS: &str = "/promotions";
pub const REVIEWS: &str = "/reviews";
pub const NOTIFICATIONS: &str = "/notifications";

/// Routes that do not require a session.
pub const PUBLIC: &[&str] = &[LOGIN];

/// Whether `route` is reachable without a session.
pub fn is_public(route: &str) -> bool {
    PUBLIC.contains(&route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_login_is_public() {
        assert!(is_public(LOGIN));
        assert!(!is_public(DASHBOARD));
        assert!(!is_public(ORDERS));
        assert!(!is_public("/login/nested"));
    }
}
